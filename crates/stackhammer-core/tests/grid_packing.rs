mod common;

use common::regions_equal;
use image::{Rgba, RgbaImage};
use stackhammer_core::packer::grid_for;
use stackhammer_core::prelude::*;

/// A strip of `n` distinct `t`x`t` tiles.
fn distinct_strip(n: u32, t: u32) -> RgbaImage {
    RgbaImage::from_fn(n * t, t, |x, y| {
        let k = x / t;
        Rgba([(k * 3) as u8, (k >> 8) as u8 + (y % 2) as u8, 77, 255])
    })
}

fn unique_set(n: u32, t: u32) -> UniqueTileSet {
    let src = SourceImage::from_rgba(distinct_strip(n, t)).expect("source");
    let tiles = partition(&src, t, t).expect("partition");
    let (set, _) = deduplicate(&tiles).expect("complete grid");
    assert_eq!(set.len(), n as usize);
    set
}

#[test]
fn auto_grid_is_near_square() {
    let cases = [
        (1, 1, 1),
        (2, 2, 1),
        (3, 2, 2),
        (4, 2, 2),
        (5, 3, 2),
        (9, 3, 3),
        (10, 4, 3),
        (16, 4, 4),
        (17, 5, 4),
        (100, 10, 10),
        (101, 11, 10),
    ];
    for (count, columns, rows) in cases {
        let grid = grid_for(count, ColumnPolicy::Auto).expect("grid");
        assert_eq!(grid, TileGrid { columns, rows }, "count = {count}");
        assert!(grid.len() >= count);
    }
}

#[test]
fn fixed_columns_clamp_to_count() {
    assert_eq!(
        grid_for(7, ColumnPolicy::Fixed(3)).expect("grid"),
        TileGrid { columns: 3, rows: 3 }
    );
    assert_eq!(
        grid_for(4, ColumnPolicy::Fixed(10)).expect("grid"),
        TileGrid { columns: 4, rows: 1 }
    );
    assert_eq!(
        grid_for(6, ColumnPolicy::Fixed(1)).expect("grid"),
        TileGrid { columns: 1, rows: 6 }
    );
}

#[test]
fn empty_and_zero_column_grids_fail() {
    assert_eq!(grid_for(0, ColumnPolicy::Auto).unwrap_err().kind(), ErrorKind::Pack);
    assert_eq!(grid_for(3, ColumnPolicy::Fixed(0)).unwrap_err().kind(), ErrorKind::Pack);
    let empty = UniqueTileSet::new();
    assert!(matches!(
        pack(&empty, 16, 16, ColumnPolicy::Auto),
        Err(StackHammerError::Pack(_))
    ));
}

#[test]
fn placements_follow_row_major_slots() {
    let set = unique_set(7, 8);
    let layout = pack(&set, 8, 8, ColumnPolicy::Auto).expect("pack");
    assert_eq!(layout.grid, TileGrid { columns: 3, rows: 3 });
    assert_eq!((layout.width(), layout.height()), (24, 24));
    assert_eq!(layout.free_slots(), 2);
    for (i, p) in layout.placements.iter().enumerate() {
        assert_eq!(p.index, i);
        let (row, col) = (i as u32 / 3, i as u32 % 3);
        assert_eq!(p.pos, TilePos::new(row, col));
        assert_eq!(p.frame, Rect::new(col * 8, row * 8, 8, 8));
    }
}

#[test]
fn compose_copies_each_tile_into_its_slot() {
    let set = unique_set(5, 4);
    let layout = pack(&set, 4, 4, ColumnPolicy::Auto).expect("pack");
    let atlas = compose(&layout, &set).expect("compose");
    assert_eq!(atlas.dimensions(), (12, 8));

    for p in &layout.placements {
        let tile = set.get(p.index).expect("tile").pixels();
        assert!(regions_equal(tile, 0, 0, &atlas, p.frame.x, p.frame.y, 4, 4));
    }
    // slot 5 is unused and stays transparent
    for y in 4..8 {
        for x in 8..12 {
            assert_eq!(atlas.get_pixel(x, y)[3], 0);
        }
    }
}

#[test]
fn packing_is_deterministic() {
    let set = unique_set(23, 4);
    let a = pack(&set, 4, 4, ColumnPolicy::Auto).expect("pack");
    let b = pack(&set, 4, 4, ColumnPolicy::Auto).expect("pack");
    assert_eq!(a, b);
    assert_eq!(
        compose(&a, &set).expect("compose"),
        compose(&b, &set).expect("compose")
    );
}

#[test]
fn mismatched_tile_size_is_a_pack_error() {
    let set = unique_set(3, 8);
    let err = pack(&set, 16, 16, ColumnPolicy::Auto).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Pack);
}
