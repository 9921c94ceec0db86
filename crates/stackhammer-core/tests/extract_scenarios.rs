mod common;

use common::regions_equal;
use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use stackhammer_core::codec::encode_rgba;
use stackhammer_core::prelude::*;

fn checker_tile(t: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(t, t, |x, y| {
        if (x / 2 + y / 2) % 2 == 0 {
            Rgba([seed, 0, 255 - seed, 255])
        } else {
            Rgba([0, seed, 0, 255])
        }
    })
}

fn tiled(layout: &[Vec<u8>], t: u32) -> RgbaImage {
    let rows = layout.len() as u32;
    let cols = layout[0].len() as u32;
    let mut img = RgbaImage::new(cols * t, rows * t);
    for (r, row) in layout.iter().enumerate() {
        for (c, &seed) in row.iter().enumerate() {
            image::imageops::replace(
                &mut img,
                &checker_tile(t, seed),
                (c as u32 * t) as i64,
                (r as u32 * t) as i64,
            );
        }
    }
    img
}

fn random_level(seed: u64, rows: usize, cols: usize, kinds: u8) -> Vec<Vec<u8>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(0..kinds) * 20 + 10).collect())
        .collect()
}

fn png(img: &RgbaImage) -> Vec<u8> {
    encode_rgba(img, OutputFormat::Png).expect("encode png")
}

#[test]
fn identical_quadrants_collapse_to_one_tile() {
    let img = tiled(&[vec![40, 40], vec![40, 40]], 16);
    assert_eq!(img.dimensions(), (32, 32));
    let cfg = ExtractConfig::builder().with_tile_size(16, 16).build();
    let tileset = extract_tileset(&png(&img), &cfg).expect("extract");

    assert_eq!(tileset.unique_tiles(), 1);
    assert_eq!(tileset.index.entries(), &[0, 0, 0, 0]);
    assert_eq!((tileset.width(), tileset.height()), (16, 16));
    assert_eq!(tileset.rgba, checker_tile(16, 40));

    let decoded = image::load_from_memory(&tileset.encoded).expect("decodable output");
    assert_eq!(decoded.to_rgba8(), tileset.rgba);
}

#[test]
fn identical_input_gives_identical_output() {
    let bytes = png(&tiled(&random_level(5, 6, 8, 4), 16));
    let cfg = ExtractConfig::default();
    let a = extract_tileset(&bytes, &cfg).expect("first");
    let b = extract_tileset(&bytes, &cfg).expect("second");
    assert_eq!(a.encoded, b.encoded);
    assert_eq!(a.index, b.index);
    assert_eq!(a.fingerprints, b.fingerprints);
    assert_eq!(a.layout, b.layout);

    let par_cfg = ExtractConfig::builder().parallel(true).build();
    let c = extract_tileset(&bytes, &par_cfg).expect("parallel");
    assert_eq!(a.encoded, c.encoded);
}

#[test]
fn misaligned_source_is_a_dimension_error() {
    let img = RgbaImage::from_pixel(40, 32, Rgba([1, 2, 3, 255]));
    let err = extract_tileset(&png(&img), &ExtractConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        StackHammerError::NonMultipleDimensions {
            width: 40,
            height: 32,
            tile_width: 16,
            tile_height: 16
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Dimension);
}

#[test]
fn every_source_tile_is_found_in_the_atlas() {
    let img = tiled(&random_level(77, 7, 9, 5), 8);
    let cfg = ExtractConfig::builder().with_tile_size(8, 8).build();
    let tileset = extract_tileset_from_image(img.clone(), &cfg).expect("extract");

    for (pos, _) in tileset.index.iter() {
        let frame = tileset.frame_for(pos).expect("frame");
        assert!(regions_equal(
            &img,
            pos.col * 8,
            pos.row * 8,
            &tileset.rgba,
            frame.x,
            frame.y,
            8,
            8
        ));
    }
}

#[test]
fn five_unique_tiles_pack_three_by_two() {
    let img = tiled(&[vec![10, 30, 50, 70, 90, 10, 30]], 16);
    let tileset =
        extract_tileset_from_image(img, &ExtractConfig::default()).expect("extract");
    assert_eq!(tileset.unique_tiles(), 5);
    assert_eq!(tileset.layout.grid, TileGrid { columns: 3, rows: 2 });
    assert_eq!((tileset.width(), tileset.height()), (48, 32));
    assert_eq!(tileset.meta.source_size, (112, 16));
    assert_eq!(tileset.meta.atlas_size, (48, 32));

    let stats = tileset.stats();
    assert_eq!(stats.source_tiles, 7);
    assert_eq!(stats.unique_tiles, 5);
    assert_eq!(stats.duplicate_tiles, 2);
    assert_eq!(stats.wasted_area(), 256);
    assert!(stats.summary().contains("Unique: 5"));
}

#[test]
fn fixed_columns_make_a_strip() {
    let img = tiled(&[vec![10, 30], vec![50, 70]], 16);
    let cfg = ExtractConfig::builder().columns(ColumnPolicy::Fixed(1)).build();
    let tileset = extract_tileset_from_image(img, &cfg).expect("extract");
    assert_eq!((tileset.width(), tileset.height()), (16, 64));
}

#[test]
fn data_url_in_data_url_out() {
    let img = tiled(&[vec![10, 30], vec![30, 10]], 16);
    let url = to_data_url("image/png", &png(&img));
    let tileset = extract_tileset_from_data_url(&url, &ExtractConfig::default()).expect("extract");
    let out = tileset.to_data_url();
    assert!(out.starts_with("data:image/png;base64,"));
    let back = parse_data_url(&out).expect("parse");
    assert_eq!(back.bytes, tileset.encoded);
    assert_eq!(tileset.width(), 32);
    assert_eq!(tileset.height(), 16);
}

#[test]
fn garbage_input_is_reported_not_defaulted() {
    let url = to_data_url("image/png", b"this is not a png");
    let err = extract_tileset_from_data_url(&url, &ExtractConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn invalid_config_is_rejected_before_decoding() {
    let cfg = ExtractConfig::builder().with_tile_size(0, 16).build();
    let err = extract_tileset(b"whatever", &cfg).unwrap_err();
    assert!(matches!(err, StackHammerError::InvalidConfig(_)));
}

#[test]
fn oversized_in_memory_image_overflows() {
    let cfg = ExtractConfig::builder().max_dimension(32).build();
    let err = extract_tileset_from_image(RgbaImage::new(64, 16), &cfg).unwrap_err();
    assert!(matches!(err, StackHammerError::DimensionOverflow { max: 32, .. }));
}

#[test]
fn json_export_describes_map_and_tiles() {
    let img = tiled(&[vec![10, 30, 10], vec![30, 30, 50]], 16);
    let tileset = extract_tileset_from_image(img, &ExtractConfig::default()).expect("extract");
    let json = to_json(&tileset);

    let obj = json.as_object().expect("object");
    assert!(obj.contains_key("meta"));
    assert!(obj.contains_key("grid"));
    assert_eq!(json["map"], serde_json::json!([[0, 1, 0], [1, 1, 2]]));
    let tiles = json["tiles"].as_array().expect("tiles");
    assert_eq!(tiles.len(), 3);
    assert_eq!(tiles[2]["firstSeen"], serde_json::json!({"row": 1, "col": 2}));
    assert_eq!(tiles[2]["frame"], serde_json::json!({"x": 0, "y": 16, "w": 16, "h": 16}));
    assert_eq!(tiles[0]["fingerprint"].as_str().expect("hex").len(), 64);
    assert_eq!(json["grid"]["size"], serde_json::json!({"w": 32, "h": 32}));
    assert_eq!(json["meta"]["app"], "stackhammer");
}
