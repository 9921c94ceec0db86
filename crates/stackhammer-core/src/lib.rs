//! Core library for turning game screenshots and sprite sheets into tilesets.
//!
//! - Pipeline: decode -> partition into fixed-size tiles -> deduplicate by BLAKE3 fingerprint -> pack on a grid -> encode
//! - Engine: `extract` / `save` boundary operations over an injectable single-slot `SessionStore`
//! - Tile maps are exportable as JSON (`export::to_json`) alongside the tileset image.
//!
//! Quick example:
//! ```ignore
//! use stackhammer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let cfg = ExtractConfig::builder().with_tile_size(16, 16).build();
//! let engine = Engine::new(cfg);
//! let url = engine.extract_data_url(&std::fs::read_to_string("level.dataurl")?)?;
//! println!("tileset: {} chars", url.len());
//! engine.save(DEFAULT_FILE_NAME)?;
//! # Ok(()) }
//! ```

pub mod budget;
pub mod codec;
pub mod compositing;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod partition;
pub mod pipeline;
pub mod session;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `stackhammer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::budget::Deadline;
    pub use crate::codec::{DataUrl, DecodeLimits, decode, encode, parse_data_url, to_data_url};
    pub use crate::config::{ColumnPolicy, ExtractConfig, ExtractConfigBuilder, OutputFormat};
    pub use crate::dedup::{TileIndex, UniqueTile, UniqueTileSet, deduplicate, fingerprint};
    pub use crate::engine::{DEFAULT_FILE_NAME, Engine, SavedTileset};
    pub use crate::error::{ErrorKind, Result, StackHammerError};
    pub use crate::model::{
        Meta, Rect, SourceImage, TileFingerprint, TileGrid, TilePos, TilesetStats,
    };
    pub use crate::packer::{PackedLayout, Placement, compose, pack};
    pub use crate::partition::{Tile, partition};
    pub use crate::session::SessionStore;
    pub use crate::{
        Tileset, extract_tileset, extract_tileset_from_data_url, extract_tileset_from_image,
        to_json,
    };
}
