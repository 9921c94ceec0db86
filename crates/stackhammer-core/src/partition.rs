use crate::error::{Result, StackHammerError};
use crate::model::{Rect, SourceImage, TileGrid, TilePos};
use image::RgbaImage;

/// A tile-sized window into a [`SourceImage`].
///
/// Equality compares pixel content, so two tiles at different positions with
/// the same pixels are equal.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    source: &'a SourceImage,
    /// Grid position in tile units.
    pub pos: TilePos,
    /// Pixel rectangle inside the source.
    pub rect: Rect,
}

impl<'a> Tile<'a> {
    /// Scanlines of the tile, top to bottom, as RGBA8 bytes.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let source = self.source;
        let rect = self.rect;
        (rect.y..rect.y + rect.h).map(move |y| source.row_bytes(rect.x, y, rect.w))
    }

    /// Copies the tile pixels into an owned image.
    pub fn to_image(&self) -> RgbaImage {
        let Rect { x, y, w, h } = self.rect;
        image::imageops::crop_imm(self.source.as_rgba(), x, y, w, h).to_image()
    }
}

impl PartialEq for Tile<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.rect.w == other.rect.w
            && self.rect.h == other.rect.h
            && self.rows().eq(other.rows())
    }
}

impl Eq for Tile<'_> {}

/// Grid a `width`x`height` image splits into, or a dimension error.
pub fn tile_grid(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<TileGrid> {
    if tile_width == 0 || tile_height == 0 {
        return Err(StackHammerError::InvalidConfig(format!(
            "tile size must be non-zero, got {}x{}",
            tile_width, tile_height
        )));
    }
    if width % tile_width != 0 || height % tile_height != 0 {
        return Err(StackHammerError::NonMultipleDimensions {
            width,
            height,
            tile_width,
            tile_height,
        });
    }
    Ok(TileGrid {
        columns: width / tile_width,
        rows: height / tile_height,
    })
}

/// Slices `source` into tiles in row-major order (top-to-bottom, left-to-right).
///
/// The source must be an exact multiple of the tile size; nothing is cropped
/// or padded.
pub fn partition(source: &SourceImage, tile_width: u32, tile_height: u32) -> Result<Vec<Tile<'_>>> {
    let (width, height) = source.dimensions();
    let grid = tile_grid(width, height, tile_width, tile_height)?;
    let mut tiles = Vec::with_capacity(grid.len());
    for row in 0..grid.rows {
        for col in 0..grid.columns {
            tiles.push(Tile {
                source,
                pos: TilePos::new(row, col),
                rect: Rect::new(col * tile_width, row * tile_height, tile_width, tile_height),
            });
        }
    }
    Ok(tiles)
}
