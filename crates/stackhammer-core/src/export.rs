use crate::pipeline::Tileset;
use serde_json::{Value, json};

/// Serialize a tileset's layout and tile map as JSON.
///
/// Shape: `{ meta, grid, tiles: [{ index, fingerprint, firstSeen, frame }], map: [[index, ...], ...] }`.
/// `map` has one array per source row; each entry indexes `tiles`.
pub fn to_json(tileset: &Tileset) -> Value {
    let layout = &tileset.layout;
    let tiles: Vec<Value> = layout
        .placements
        .iter()
        .map(|p| {
            let fingerprint = tileset
                .fingerprints
                .get(p.index)
                .map(|f| f.to_hex())
                .unwrap_or_default();
            let first_seen = tileset
                .first_seen
                .get(p.index)
                .map(|pos| json!({"row": pos.row, "col": pos.col}))
                .unwrap_or(Value::Null);
            json!({
                "index": p.index,
                "fingerprint": fingerprint,
                "firstSeen": first_seen,
                "slot": {"row": p.pos.row, "col": p.pos.col},
                "frame": {"x": p.frame.x, "y": p.frame.y, "w": p.frame.w, "h": p.frame.h},
            })
        })
        .collect();
    let map: Vec<Value> = tileset.index.rows().map(|row| json!(row)).collect();
    let source_grid = tileset.index.grid();
    json!({
        "meta": &tileset.meta,
        "grid": {
            "columns": layout.grid.columns,
            "rows": layout.grid.rows,
            "tileSize": {"w": layout.tile_width, "h": layout.tile_height},
            "size": {"w": layout.width(), "h": layout.height()},
        },
        "source": {
            "columns": source_grid.columns,
            "rows": source_grid.rows,
        },
        "tiles": tiles,
        "map": map,
    })
}
