//! The two boundary operations a host application calls: extract and save.
//!
//! Both are synchronous; run them on whatever thread or task the host prefers.
//! Extraction does all its work before touching the store, and save reads a
//! snapshot, so the two can race without either observing a partial tileset.

use crate::config::ExtractConfig;
use crate::error::{Result, StackHammerError};
use crate::pipeline::{self, Tileset};
use crate::session::SessionStore;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

/// File name proposed for a saved tileset.
pub const DEFAULT_FILE_NAME: &str = "stackhammer_tileset.png";

/// Confirmation of a completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTileset {
    pub path: PathBuf,
    pub bytes_written: usize,
    /// Where the JSON tile map went, when requested.
    pub metadata_path: Option<PathBuf>,
}

/// Extraction engine bound to a session store.
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: ExtractConfig,
    store: Arc<SessionStore>,
}

impl Engine {
    /// Creates an engine with its own empty store.
    pub fn new(cfg: ExtractConfig) -> Self {
        Self::with_store(cfg, Arc::new(SessionStore::new()))
    }

    /// Creates an engine that publishes into `store`.
    pub fn with_store(cfg: ExtractConfig, store: Arc<SessionStore>) -> Self {
        Self { cfg, store }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Extracts a tileset from a `data:` URL, stores it, and returns the
    /// tileset as a `data:` URL.
    #[instrument(skip_all)]
    pub fn extract_data_url(&self, data_url: &str) -> Result<String> {
        let tileset = pipeline::extract_tileset_from_data_url(data_url, &self.cfg)?;
        Ok(self.publish(tileset).to_data_url())
    }

    /// Extracts a tileset from encoded image bytes and stores it.
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<Arc<Tileset>> {
        let tileset = pipeline::extract_tileset(bytes, &self.cfg)?;
        Ok(self.publish(tileset))
    }

    /// Extracts a tileset from decoded pixels and stores it.
    pub fn extract_image(&self, image: RgbaImage) -> Result<Arc<Tileset>> {
        let tileset = pipeline::extract_tileset_from_image(image, &self.cfg)?;
        Ok(self.publish(tileset))
    }

    fn publish(&self, tileset: Tileset) -> Arc<Tileset> {
        let stats = tileset.stats();
        debug!(
            source_tiles = stats.source_tiles,
            unique_tiles = stats.unique_tiles,
            "publishing tileset"
        );
        self.store.put(tileset)
    }

    /// Most recent tileset, or [`StackHammerError::StoreEmpty`].
    pub fn current(&self) -> Result<Arc<Tileset>> {
        self.store.get()
    }

    /// Writes the most recent tileset to `dest`.
    ///
    /// Fails with [`StackHammerError::StoreEmpty`] when nothing has been
    /// extracted yet.
    #[instrument(skip_all, fields(dest = %dest.as_ref().display()))]
    pub fn save(&self, dest: impl AsRef<Path>) -> Result<SavedTileset> {
        let tileset = self.store.get()?;
        let path = dest.as_ref().to_path_buf();
        write_file(&path, &tileset.encoded)?;
        debug!(bytes = tileset.encoded.len(), "saved tileset");
        Ok(SavedTileset {
            path,
            bytes_written: tileset.encoded.len(),
            metadata_path: None,
        })
    }

    /// Like [`Engine::save`], and also writes the JSON tile map to `metadata_dest`.
    ///
    /// Both files come from the same snapshot. The tile map is written first,
    /// and the tileset is not written when that fails.
    pub fn save_with_metadata(
        &self,
        dest: impl AsRef<Path>,
        metadata_dest: impl AsRef<Path>,
    ) -> Result<SavedTileset> {
        let tileset = self.store.get()?;
        let json = serde_json::to_string_pretty(&crate::export::to_json(&tileset))
            .map_err(|e| StackHammerError::Encode(e.to_string()))?;

        let path = dest.as_ref().to_path_buf();
        let metadata_path = metadata_dest.as_ref().to_path_buf();
        write_file(&metadata_path, json.as_bytes())?;
        write_file(&path, &tileset.encoded)?;
        Ok(SavedTileset {
            path,
            bytes_written: tileset.encoded.len(),
            metadata_path: Some(metadata_path),
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
