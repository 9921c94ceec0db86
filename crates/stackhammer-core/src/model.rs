use crate::error::{Result, StackHammerError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Position of a tile in a tile grid, in tile units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    pub row: u32,
    pub col: u32,
}

impl TilePos {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Size of a tile grid, in tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
}

impl TileGrid {
    pub fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Row-major slot of `pos`, or `None` when outside the grid.
    pub fn slot(&self, pos: TilePos) -> Option<usize> {
        if pos.row < self.rows && pos.col < self.columns {
            Some(pos.row as usize * self.columns as usize + pos.col as usize)
        } else {
            None
        }
    }
    /// Inverse of [`TileGrid::slot`].
    pub fn pos(&self, slot: usize) -> TilePos {
        let cols = self.columns.max(1) as usize;
        TilePos::new((slot / cols) as u32, (slot % cols) as u32)
    }
}

/// Decoded RGBA8 source pixels. Never zero-sized.
#[derive(Debug, Clone)]
pub struct SourceImage {
    rgba: RgbaImage,
}

impl SourceImage {
    pub fn from_rgba(rgba: RgbaImage) -> Result<Self> {
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(StackHammerError::InvalidDimensions { width, height });
        }
        Ok(Self { rgba })
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.rgba
    }

    /// Raw bytes of the `w` pixels starting at `(x, y)` on one scanline.
    ///
    /// Panics if the span leaves the image.
    pub fn row_bytes(&self, x: u32, y: u32, w: u32) -> &[u8] {
        let stride = self.rgba.width() as usize * 4;
        let start = y as usize * stride + x as usize * 4;
        &self.rgba.as_raw()[start..start + w as usize * 4]
    }
}

/// 256-bit BLAKE3 digest of a tile's RGBA8 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileFingerprint([u8; 32]);

impl TileFingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first 8 bytes are plenty to tell tiles apart in logs
        write!(f, "TileFingerprint(")?;
        for b in &self.0[..8] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "..)")
    }
}

/// Tileset-level metadata carried into exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    /// Schema version of the JSON tile map; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    /// In-memory pixel layout.
    pub format: String,
    /// Encoded image format of the tileset (e.g. "png").
    pub image_format: String,
    pub tile_size: (u32, u32),
    pub source_size: (u32, u32),
    pub atlas_size: (u32, u32),
}

/// Statistics about how much a source image collapsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TilesetStats {
    /// Tiles in the source grid.
    pub source_tiles: usize,
    /// Distinct tiles kept in the tileset.
    pub unique_tiles: usize,
    /// Source tiles that reused an earlier tile.
    pub duplicate_tiles: usize,
    /// unique_tiles / source_tiles (0.0 to 1.0). Lower means more reuse.
    pub dedup_ratio: f64,
    /// Area of the packed tileset image.
    pub atlas_area: u64,
    /// Area covered by unique tiles.
    pub used_area: u64,
    /// used_area / atlas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl TilesetStats {
    pub fn new(source_tiles: usize, unique_tiles: usize, tile_area: u64, atlas_area: u64) -> Self {
        let used_area = unique_tiles as u64 * tile_area;
        let dedup_ratio = if source_tiles > 0 {
            unique_tiles as f64 / source_tiles as f64
        } else {
            0.0
        };
        let occupancy = if atlas_area > 0 {
            used_area as f64 / atlas_area as f64
        } else {
            0.0
        };
        Self {
            source_tiles,
            unique_tiles,
            duplicate_tiles: source_tiles.saturating_sub(unique_tiles),
            dedup_ratio,
            atlas_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Source tiles: {}, Unique: {}, Duplicates: {}, Kept: {:.2}%, Atlas Area: {} px², Occupancy: {:.2}%",
            self.source_tiles,
            self.unique_tiles,
            self.duplicate_tiles,
            self.dedup_ratio * 100.0,
            self.atlas_area,
            self.occupancy * 100.0,
        )
    }

    /// Returns unused atlas area in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.atlas_area.saturating_sub(self.used_area)
    }
}
