use crate::budget::Deadline;
use crate::error::{Result, StackHammerError};
use crate::model::{TileFingerprint, TileGrid, TilePos};
use crate::partition::Tile;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// tiles fingerprinted between deadline checks
const CHECK_EVERY: usize = 256;

/// Digest of the tile's RGBA8 bytes, scanline by scanline.
pub fn fingerprint(tile: &Tile<'_>) -> TileFingerprint {
    let mut hasher = blake3::Hasher::new();
    for row in tile.rows() {
        hasher.update(row);
    }
    TileFingerprint::from_bytes(*hasher.finalize().as_bytes())
}

/// A distinct tile and where it was first seen.
#[derive(Debug, Clone)]
pub struct UniqueTile {
    pub fingerprint: TileFingerprint,
    pub first_seen: TilePos,
    pixels: RgbaImage,
}

impl UniqueTile {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Distinct tiles in first-occurrence order. No two entries share a fingerprint.
#[derive(Debug, Clone, Default)]
pub struct UniqueTileSet {
    tiles: Vec<UniqueTile>,
    lookup: HashMap<TileFingerprint, usize>,
}

impl UniqueTileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UniqueTile> {
        self.tiles.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UniqueTile> {
        self.tiles.iter()
    }

    pub fn position(&self, fingerprint: &TileFingerprint) -> Option<usize> {
        self.lookup.get(fingerprint).copied()
    }

    pub fn fingerprints(&self) -> Vec<TileFingerprint> {
        self.tiles.iter().map(|t| t.fingerprint).collect()
    }

    /// Returns the index for `fingerprint`, copying `tile` in when it is new.
    /// The bool is true when the tile was inserted.
    fn insert(&mut self, fingerprint: TileFingerprint, tile: &Tile<'_>) -> (usize, bool) {
        if let Some(&idx) = self.lookup.get(&fingerprint) {
            return (idx, false);
        }
        let idx = self.tiles.len();
        self.tiles.push(UniqueTile {
            fingerprint,
            first_seen: tile.pos,
            pixels: tile.to_image(),
        });
        self.lookup.insert(fingerprint, idx);
        (idx, true)
    }
}

impl<'a> IntoIterator for &'a UniqueTileSet {
    type Item = &'a UniqueTile;
    type IntoIter = std::slice::Iter<'a, UniqueTile>;
    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Source tile position -> index into the [`UniqueTileSet`], stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileIndex {
    grid: TileGrid,
    entries: Vec<usize>,
}

impl TileIndex {
    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pos: TilePos) -> Option<usize> {
        self.grid.slot(pos).and_then(|s| self.entries.get(s).copied())
    }

    /// Row-major unique-tile indices.
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (TilePos, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(slot, &idx)| (self.grid.pos(slot), idx))
    }

    /// Index entries grouped by source row.
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.entries.chunks(self.grid.columns.max(1) as usize)
    }
}

/// Collapses pixel-identical tiles. See [`deduplicate_within`].
pub fn deduplicate(tiles: &[Tile<'_>]) -> Result<(UniqueTileSet, TileIndex)> {
    let fingerprints: Vec<TileFingerprint> = tiles.iter().map(fingerprint).collect();
    fold(tiles, &fingerprints)
}

/// Collapses pixel-identical tiles, checking `deadline` while fingerprinting.
///
/// `tiles` may arrive in any order but must cover a complete grid, each
/// position exactly once; otherwise [`StackHammerError::IncompleteGrid`].
/// Unique tiles keep first-occurrence order by row-major position, so the
/// result depends neither on slice order nor on hash map iteration order.
/// With `parallel` (and the "parallel" feature) fingerprints are computed on
/// the rayon pool, then folded sequentially.
#[instrument(skip_all, fields(tiles = tiles.len()))]
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn deduplicate_within(
    tiles: &[Tile<'_>],
    parallel: bool,
    deadline: &Deadline,
) -> Result<(UniqueTileSet, TileIndex)> {
    let fingerprints = fingerprint_all(tiles, parallel, deadline)?;
    deadline.check()?;
    let (set, index) = fold(tiles, &fingerprints)?;
    debug!(
        unique = set.len(),
        duplicates = tiles.len() - set.len(),
        "deduplicated tiles"
    );
    Ok((set, index))
}

#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn fingerprint_all(
    tiles: &[Tile<'_>],
    parallel: bool,
    deadline: &Deadline,
) -> Result<Vec<TileFingerprint>> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            let mut out = Vec::with_capacity(tiles.len());
            for chunk in tiles.chunks(CHECK_EVERY * 16) {
                deadline.check()?;
                out.par_extend(chunk.par_iter().map(fingerprint));
            }
            return Ok(out);
        }
    }

    let mut out = Vec::with_capacity(tiles.len());
    for (i, tile) in tiles.iter().enumerate() {
        if i % CHECK_EVERY == 0 {
            deadline.check()?;
        }
        out.push(fingerprint(tile));
    }
    Ok(out)
}

fn fold(
    tiles: &[Tile<'_>],
    fingerprints: &[TileFingerprint],
) -> Result<(UniqueTileSet, TileIndex)> {
    let columns = tiles.iter().map(|t| t.pos.col + 1).max().unwrap_or(0);
    let rows = tiles.iter().map(|t| t.pos.row + 1).max().unwrap_or(0);
    let grid = TileGrid { columns, rows };

    // slot -> position of that tile in `tiles`
    let mut by_slot: Vec<Option<usize>> = vec![None; grid.len()];
    for (i, tile) in tiles.iter().enumerate() {
        let slot = grid.slot(tile.pos).ok_or_else(|| {
            StackHammerError::IncompleteGrid(format!("tile {:?} outside the grid", tile.pos))
        })?;
        if by_slot[slot].replace(i).is_some() {
            return Err(StackHammerError::IncompleteGrid(format!(
                "more than one tile at row {} col {}",
                tile.pos.row, tile.pos.col
            )));
        }
    }

    let mut set = UniqueTileSet::new();
    let mut entries = Vec::with_capacity(grid.len());
    for (slot, found) in by_slot.into_iter().enumerate() {
        let i = found.ok_or_else(|| {
            let pos = grid.pos(slot);
            StackHammerError::IncompleteGrid(format!(
                "no tile at row {} col {} of a {}x{} grid",
                pos.row, pos.col, grid.columns, grid.rows
            ))
        })?;
        let (idx, _) = set.insert(fingerprints[i], &tiles[i]);
        entries.push(idx);
    }
    Ok((set, TileIndex { grid, entries }))
}
