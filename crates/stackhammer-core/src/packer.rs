use crate::config::ColumnPolicy;
use crate::dedup::UniqueTileSet;
use crate::error::{Result, StackHammerError};
use crate::model::{Rect, TileGrid, TilePos};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Where one unique tile lands in the tileset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    /// Index into the [`UniqueTileSet`].
    pub index: usize,
    /// Slot in the output grid.
    pub pos: TilePos,
    /// Pixel rectangle in the output image.
    pub frame: Rect,
}

/// Output grid plus one placement per unique tile, in tile-set order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackedLayout {
    pub grid: TileGrid,
    pub tile_width: u32,
    pub tile_height: u32,
    pub placements: Vec<Placement>,
}

impl PackedLayout {
    pub fn width(&self) -> u32 {
        self.grid.columns * self.tile_width
    }

    pub fn height(&self) -> u32 {
        self.grid.rows * self.tile_height
    }

    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.get(index)
    }

    /// Grid slots left empty after the last tile.
    pub fn free_slots(&self) -> usize {
        self.grid.len().saturating_sub(self.placements.len())
    }
}

/// Smallest `c` with `c * c >= n`.
fn ceil_sqrt(n: u64) -> u64 {
    let mut c = (n as f64).sqrt() as u64;
    while c * c < n {
        c += 1;
    }
    while c > 1 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c
}

/// Grid used for `count` tiles under `policy`. Deterministic for a given count.
pub fn grid_for(count: usize, policy: ColumnPolicy) -> Result<TileGrid> {
    if count == 0 {
        return Err(StackHammerError::Pack("no tiles to pack".into()));
    }
    let count = count as u64;
    let columns = match policy {
        ColumnPolicy::Auto => ceil_sqrt(count),
        ColumnPolicy::Fixed(0) => {
            return Err(StackHammerError::Pack(
                "fixed column count must be at least 1".into(),
            ));
        }
        ColumnPolicy::Fixed(n) => (n as u64).min(count),
    };
    let rows = count.div_ceil(columns);
    let columns = u32::try_from(columns)
        .map_err(|_| StackHammerError::Pack(format!("{columns} columns overflow")))?;
    let rows =
        u32::try_from(rows).map_err(|_| StackHammerError::Pack(format!("{rows} rows overflow")))?;
    Ok(TileGrid { columns, rows })
}

/// Lays out every tile of `set` on a grid, slot `i` at row `i / columns`,
/// column `i % columns`.
pub fn pack(
    set: &UniqueTileSet,
    tile_width: u32,
    tile_height: u32,
    policy: ColumnPolicy,
) -> Result<PackedLayout> {
    if tile_width == 0 || tile_height == 0 {
        return Err(StackHammerError::Pack(format!(
            "tile size must be non-zero, got {}x{}",
            tile_width, tile_height
        )));
    }
    let grid = grid_for(set.len(), policy)?;
    let overflow = || {
        StackHammerError::Pack(format!(
            "{}x{} tiles of {}x{} px overflow the image size",
            grid.columns, grid.rows, tile_width, tile_height
        ))
    };
    grid.columns.checked_mul(tile_width).ok_or_else(overflow)?;
    grid.rows.checked_mul(tile_height).ok_or_else(overflow)?;

    let mut placements = Vec::with_capacity(set.len());
    for (index, tile) in set.iter().enumerate() {
        if tile.pixels().dimensions() != (tile_width, tile_height) {
            return Err(StackHammerError::Pack(format!(
                "tile {} is {}x{}, expected {}x{}",
                index,
                tile.pixels().width(),
                tile.pixels().height(),
                tile_width,
                tile_height
            )));
        }
        let pos = grid.pos(index);
        placements.push(Placement {
            index,
            pos,
            frame: Rect::new(
                pos.col * tile_width,
                pos.row * tile_height,
                tile_width,
                tile_height,
            ),
        });
    }
    Ok(PackedLayout {
        grid,
        tile_width,
        tile_height,
        placements,
    })
}

/// Copies each unique tile into its placement. Unused slots stay transparent.
pub fn compose(layout: &PackedLayout, set: &UniqueTileSet) -> Result<RgbaImage> {
    if layout.placements.len() != set.len() {
        return Err(StackHammerError::Pack(format!(
            "layout has {} placements for {} tiles",
            layout.placements.len(),
            set.len()
        )));
    }
    let mut canvas = RgbaImage::new(layout.width(), layout.height());
    let bounds = Rect::new(0, 0, canvas.width(), canvas.height());
    for placement in &layout.placements {
        let tile = set.get(placement.index).ok_or_else(|| {
            StackHammerError::Pack(format!("placement refers to missing tile {}", placement.index))
        })?;
        if !bounds.contains(&placement.frame) {
            return Err(StackHammerError::Pack(format!(
                "placement {:?} leaves the {}x{} canvas",
                placement.frame,
                canvas.width(),
                canvas.height()
            )));
        }
        crate::compositing::blit_rgba(tile.pixels(), &mut canvas, placement.frame.x, placement.frame.y);
    }
    Ok(canvas)
}
