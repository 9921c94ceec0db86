use image::{Rgba, RgbaImage};
use stackhammer_core::codec::encode_rgba;
use stackhammer_core::prelude::*;

fn noise(w: u32, h: u32) -> RgbaImage {
    let mut state = 0x2545_f491u32;
    RgbaImage::from_fn(w, h, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let b = state.to_le_bytes();
        Rgba([b[0], b[1], b[2], b[3]])
    })
}

#[test]
fn parses_base64_data_urls() {
    let url = parse_data_url("data:image/png;base64,AAEC").expect("parse");
    assert_eq!(url.mime, "image/png");
    assert_eq!(url.bytes, vec![0, 1, 2]);

    let url = parse_data_url("DATA:Image/PNG;name=level.png;base64,AAEC\n").expect("parse");
    assert_eq!(url.mime, "image/png");
    assert_eq!(url.bytes, vec![0, 1, 2]);

    let url = parse_data_url("data:;base64,AA\nEC").expect("parse");
    assert_eq!(url.mime, "application/octet-stream");
    assert_eq!(url.bytes, vec![0, 1, 2]);
}

#[test]
fn formats_data_urls() {
    assert_eq!(to_data_url("image/png", &[0, 1, 2]), "data:image/png;base64,AAEC");
    let back = parse_data_url(&to_data_url("image/bmp", b"tiles")).expect("parse");
    assert_eq!(back.bytes, b"tiles");
}

#[test]
fn malformed_data_urls_are_decode_errors() {
    let cases = [
        "image/png;base64,AAEC",
        "data:image/png;base64",
        "data:image/png,AAEC",
        "",
    ];
    for case in cases {
        let err = parse_data_url(case).unwrap_err();
        assert!(matches!(err, StackHammerError::InvalidDataUrl(_)), "{case:?}");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
    let err = parse_data_url("data:image/png;base64,@@@@").unwrap_err();
    assert!(matches!(err, StackHammerError::Base64(_)));
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn decode_is_lossless_for_png() {
    let img = noise(24, 16);
    let bytes = encode_rgba(&img, OutputFormat::Png).expect("encode");
    let src = decode(&bytes, &DecodeLimits::default()).expect("decode");
    assert_eq!(src.as_rgba(), &img);
}

#[test]
fn unknown_bytes_are_unsupported() {
    let err = decode(b"definitely not an image", &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, StackHammerError::UnsupportedFormat(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn truncated_png_is_corrupt() {
    let bytes = encode_rgba(&noise(64, 64), OutputFormat::Png).expect("encode");
    let truncated = &bytes[..bytes.len() / 2];
    let err = decode(truncated, &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, StackHammerError::CorruptImage(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn oversized_images_overflow() {
    let bytes = encode_rgba(&noise(64, 32), OutputFormat::Png).expect("encode");
    let limits = DecodeLimits {
        max_dimension: 32,
        ..DecodeLimits::default()
    };
    match decode(&bytes, &limits) {
        Err(StackHammerError::DimensionOverflow { width, height, max }) => {
            assert_eq!((width, height, max), (64, 32, 32));
        }
        other => panic!("expected DimensionOverflow, got {:?}", other.map(|s| s.dimensions())),
    }
}

#[test]
fn allocation_cap_is_reported_separately_from_side_limit() {
    let bytes = encode_rgba(&noise(64, 64), OutputFormat::Png).expect("encode");
    let limits = DecodeLimits {
        max_dimension: 16_384,
        max_alloc_bytes: 1024,
    };
    let err = decode(&bytes, &limits).unwrap_err();
    match &err {
        StackHammerError::ImageTooLarge { bytes, max_alloc } => {
            assert_eq!((*bytes, *max_alloc), (64 * 64 * 4, 1024));
        }
        other => panic!("expected ImageTooLarge, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Dimension);
    let msg = err.to_string();
    assert!(msg.contains("1024"), "{msg}");
    assert!(!msg.contains("per side"), "{msg}");
}

#[test]
fn allocation_cap_applies_to_in_memory_images() {
    let cfg = ExtractConfig::builder().max_alloc_bytes(1024).build();
    let err = extract_tileset_from_image(noise(32, 32), &cfg).unwrap_err();
    assert!(matches!(
        err,
        StackHammerError::ImageTooLarge { bytes: 4096, max_alloc: 1024 }
    ));
}

#[test]
fn encode_checks_buffer_length() {
    let err = encode(&[0u8; 15], 2, 2, OutputFormat::Png).unwrap_err();
    assert!(matches!(err, StackHammerError::Encode(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(encode(&[], 0, 0, OutputFormat::Png).is_err());
}

#[test]
fn output_formats_carry_their_signature() {
    let img = noise(8, 8);
    let png = encode_rgba(&img, OutputFormat::Png).expect("png");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let bmp = encode_rgba(&img, OutputFormat::Bmp).expect("bmp");
    assert_eq!(&bmp[..2], b"BM");
    assert_eq!(OutputFormat::Bmp.mime(), "image/bmp");
    let tga = encode_rgba(&img, OutputFormat::Tga).expect("tga");
    assert!(!tga.is_empty());
    assert_eq!(OutputFormat::Tga.extension(), "tga");
}
