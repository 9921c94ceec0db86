//! Image decoding/encoding and data URL helpers.
//!
//! Everything here is a pure transform over bytes: no filesystem access, no
//! shared state.

use crate::config::OutputFormat;
use crate::error::{Result, StackHammerError};
use crate::model::SourceImage;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, ImageError, ImageReader, Limits, RgbaImage};
use std::io::Cursor;
use tracing::{debug, instrument};

/// Bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted width or height.
    pub max_dimension: u32,
    /// Upper bound on decoder allocations, in bytes.
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_dimension: 16_384,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Decodes `bytes` into an RGBA8 source image.
///
/// The format is sniffed from the content, not from any file name or MIME
/// type. The header is read first so oversized images are rejected before any
/// pixel buffer is allocated.
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<SourceImage> {
    let header = reader_for(bytes)?;
    let format = header.format();
    let (width, height) = header.into_dimensions().map_err(map_image_error)?;
    if width == 0 || height == 0 {
        return Err(StackHammerError::InvalidDimensions { width, height });
    }
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(StackHammerError::DimensionOverflow {
            width,
            height,
            max: limits.max_dimension,
        });
    }
    let rgba_bytes = rgba8_len(width, height);
    if rgba_bytes > limits.max_alloc_bytes {
        return Err(StackHammerError::ImageTooLarge {
            bytes: rgba_bytes,
            max_alloc: limits.max_alloc_bytes,
        });
    }

    let mut reader = reader_for(bytes)?;
    let mut decoder_limits = Limits::default();
    decoder_limits.max_image_width = Some(limits.max_dimension);
    decoder_limits.max_image_height = Some(limits.max_dimension);
    decoder_limits.max_alloc = Some(limits.max_alloc_bytes);
    reader.limits(decoder_limits);

    // dimensions already passed, so a limits error here is the allocation cap
    let image = reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => StackHammerError::ImageTooLarge {
            bytes: rgba_bytes,
            max_alloc: limits.max_alloc_bytes,
        },
        other => map_image_error(other),
    })?;
    debug!(?format, width, height, "decoded source image");
    SourceImage::from_rgba(image.to_rgba8())
}

/// Size of a tightly packed RGBA8 buffer.
pub(crate) fn rgba8_len(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 4
}

fn reader_for(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StackHammerError::CorruptImage(e.to_string()))?;
    if reader.format().is_none() {
        return Err(StackHammerError::UnsupportedFormat(
            "unrecognised image signature".into(),
        ));
    }
    Ok(reader)
}

fn map_image_error(e: ImageError) -> StackHammerError {
    match e {
        ImageError::Unsupported(u) => StackHammerError::UnsupportedFormat(u.to_string()),
        other => StackHammerError::CorruptImage(other.to_string()),
    }
}

/// Encodes a tightly packed RGBA8 buffer as `format`.
pub fn encode(pixels: &[u8], width: u32, height: u32, format: OutputFormat) -> Result<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| StackHammerError::Encode(format!("{width}x{height} overflows")))?;
    if width == 0 || height == 0 || pixels.len() != expected {
        return Err(StackHammerError::Encode(format!(
            "buffer of {} bytes does not match {}x{} RGBA8",
            pixels.len(),
            width,
            height
        )));
    }
    let mut out = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut out),
        pixels,
        width,
        height,
        ExtendedColorType::Rgba8,
        format.image_format(),
    )
    .map_err(|e| StackHammerError::Encode(e.to_string()))?;
    Ok(out)
}

/// Convenience wrapper over [`encode`] for an `RgbaImage`.
pub fn encode_rgba(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    encode(image.as_raw(), image.width(), image.height(), format)
}

/// Decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type from the header; `application/octet-stream` when omitted.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parses `data:<mime>[;param]*;base64,<payload>`.
///
/// Only base64 payloads are accepted. ASCII whitespace inside the payload
/// (line-wrapped base64) is ignored.
pub fn parse_data_url(url: &str) -> Result<DataUrl> {
    let url = url.trim();
    let scheme = url.get(..5).unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("data:") {
        return Err(StackHammerError::InvalidDataUrl(
            "missing `data:` scheme".into(),
        ));
    }
    let (header, payload) = url[5..]
        .split_once(',')
        .ok_or_else(|| StackHammerError::InvalidDataUrl("missing `,` separator".into()))?;

    let mut params = header.split(';');
    let mime = match params.next().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => "application/octet-stream".to_string(),
    };
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(StackHammerError::InvalidDataUrl(
            "only base64-encoded payloads are supported".into(),
        ));
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned)?;
    Ok(DataUrl { mime, bytes })
}

/// Formats `bytes` as `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
