use crate::budget::Deadline;
use crate::codec;
use crate::config::{ExtractConfig, OutputFormat};
use crate::dedup::{TileIndex, deduplicate_within};
use crate::error::{Result, StackHammerError};
use crate::model::{Meta, Rect, SourceImage, TileFingerprint, TilePos, TilesetStats};
use crate::packer::{self, PackedLayout};
use crate::partition::partition;
use image::RgbaImage;
use tracing::{debug, instrument};

/// Packed output of one extraction: the tileset image, its encoding and the
/// index back to the source grid.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Composed tileset pixels.
    pub rgba: RgbaImage,
    /// `rgba` encoded as `format`; this is what gets saved.
    pub encoded: Vec<u8>,
    pub format: OutputFormat,
    /// Source tile position -> unique tile index.
    pub index: TileIndex,
    /// Unique tile index -> slot in the tileset.
    pub layout: PackedLayout,
    /// Fingerprint of every unique tile, in tile-set order.
    pub fingerprints: Vec<TileFingerprint>,
    /// Source position where each unique tile first occurred.
    pub first_seen: Vec<TilePos>,
    pub meta: Meta,
}

impl Tileset {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn unique_tiles(&self) -> usize {
        self.layout.placements.len()
    }

    /// Rectangle in the tileset holding the tile found at `pos` in the source.
    pub fn frame_for(&self, pos: TilePos) -> Option<Rect> {
        let idx = self.index.get(pos)?;
        self.layout.placement(idx).map(|p| p.frame)
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// `data:` URL of the encoded tileset, ready for an `<img src>`.
    pub fn to_data_url(&self) -> String {
        codec::to_data_url(self.format.mime(), &self.encoded)
    }

    /// Computes deduplication and packing statistics.
    pub fn stats(&self) -> TilesetStats {
        let tile_area = (self.layout.tile_width as u64) * (self.layout.tile_height as u64);
        let atlas_area = (self.width() as u64) * (self.height() as u64);
        TilesetStats::new(self.index.len(), self.unique_tiles(), tile_area, atlas_area)
    }
}

#[instrument(skip_all, fields(len = bytes.len()))]
/// Decodes `bytes`, then partitions, deduplicates, packs and encodes.
///
/// Notes:
/// - The source must be an exact multiple of the configured tile size.
/// - Output is deterministic: identical input bytes give identical `encoded` bytes.
/// - `time_budget_ms` bounds the whole call, decoding included.
pub fn extract_tileset(bytes: &[u8], cfg: &ExtractConfig) -> Result<Tileset> {
    cfg.validate()?;
    let deadline = Deadline::new(cfg.time_budget_ms);
    let source = codec::decode(bytes, &cfg.decode_limits())?;
    build_tileset(&source, cfg, &deadline)
}

/// Same as [`extract_tileset`] for a `data:` URL.
pub fn extract_tileset_from_data_url(url: &str, cfg: &ExtractConfig) -> Result<Tileset> {
    let data = codec::parse_data_url(url)?;
    debug!(mime = %data.mime, bytes = data.bytes.len(), "parsed data URL");
    extract_tileset(&data.bytes, cfg)
}

/// Runs the pipeline on an already decoded image.
pub fn extract_tileset_from_image(image: RgbaImage, cfg: &ExtractConfig) -> Result<Tileset> {
    cfg.validate()?;
    let deadline = Deadline::new(cfg.time_budget_ms);
    let (width, height) = image.dimensions();
    if width > cfg.max_dimension || height > cfg.max_dimension {
        return Err(StackHammerError::DimensionOverflow {
            width,
            height,
            max: cfg.max_dimension,
        });
    }
    let bytes = codec::rgba8_len(width, height);
    if bytes > cfg.max_alloc_bytes {
        return Err(StackHammerError::ImageTooLarge {
            bytes,
            max_alloc: cfg.max_alloc_bytes,
        });
    }
    let source = SourceImage::from_rgba(image)?;
    build_tileset(&source, cfg, &deadline)
}

/// Partition -> deduplicate -> pack -> compose -> encode.
#[instrument(skip_all, fields(width = source.width(), height = source.height()))]
pub fn build_tileset(
    source: &SourceImage,
    cfg: &ExtractConfig,
    deadline: &Deadline,
) -> Result<Tileset> {
    deadline.check()?;
    let tiles = partition(source, cfg.tile_width, cfg.tile_height)?;

    let (set, index) = deduplicate_within(&tiles, cfg.parallel, deadline)?;

    let layout = packer::pack(&set, cfg.tile_width, cfg.tile_height, cfg.columns)?;
    let rgba = packer::compose(&layout, &set)?;
    deadline.check()?;
    debug!(
        columns = layout.grid.columns,
        rows = layout.grid.rows,
        width = rgba.width(),
        height = rgba.height(),
        "packed tileset"
    );

    let encoded = codec::encode_rgba(&rgba, cfg.output_format)?;
    deadline.check()?;
    debug!(bytes = encoded.len(), format = cfg.output_format.extension(), "encoded tileset");

    let meta = Meta {
        schema_version: "1".into(),
        app: "stackhammer".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        image_format: cfg.output_format.extension().into(),
        tile_size: (cfg.tile_width, cfg.tile_height),
        source_size: source.dimensions(),
        atlas_size: rgba.dimensions(),
    };
    Ok(Tileset {
        rgba,
        encoded,
        format: cfg.output_format,
        index,
        fingerprints: set.fingerprints(),
        first_seen: set.iter().map(|t| t.first_seen).collect(),
        layout,
        meta,
    })
}
