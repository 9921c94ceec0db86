use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackHammerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt or truncated image: {0}")]
    CorruptImage(String),
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Image {width}x{height} exceeds the maximum of {max} pixels per side")]
    DimensionOverflow { width: u32, height: u32, max: u32 },
    #[error("Decoding needs {bytes} bytes, above the {max_alloc} byte allocation limit")]
    ImageTooLarge { bytes: u64, max_alloc: u64 },
    #[error(
        "Image {width}x{height} is not a multiple of the {tile_width}x{tile_height} tile size"
    )]
    NonMultipleDimensions {
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    },
    #[error("Tiles do not form a complete grid: {0}")]
    IncompleteGrid(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Packing failed: {0}")]
    Pack(String),
    #[error("Nothing to save: no extraction has been performed yet")]
    StoreEmpty,
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Extraction exceeded its time budget ({elapsed_ms}ms > {budget_ms}ms)")]
    TimedOut { elapsed_ms: u64, budget_ms: u64 },
}

/// Coarse failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed data URL, bad base64, unknown format or corrupt image data.
    Decode,
    /// Source not tile-aligned, zero-sized, or beyond the size limits.
    Dimension,
    /// Internal packing invariant violated.
    Pack,
    /// Save requested before any extraction.
    StoreEmpty,
    /// Encoding or filesystem failure.
    Io,
    Config,
    Timeout,
}

impl StackHammerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDataUrl(_)
            | Self::Base64(_)
            | Self::UnsupportedFormat(_)
            | Self::CorruptImage(_) => ErrorKind::Decode,
            Self::InvalidDimensions { .. }
            | Self::DimensionOverflow { .. }
            | Self::ImageTooLarge { .. }
            | Self::NonMultipleDimensions { .. }
            | Self::IncompleteGrid(_) => ErrorKind::Dimension,
            Self::Pack(_) => ErrorKind::Pack,
            Self::StoreEmpty => ErrorKind::StoreEmpty,
            Self::Io(_) | Self::Encode(_) => ErrorKind::Io,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::TimedOut { .. } => ErrorKind::Timeout,
        }
    }
}

pub type Result<T> = std::result::Result<T, StackHammerError>;
