use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column count selection for the packed tileset grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// `ceil(sqrt(count))` columns; keeps the tileset close to square.
    Auto,
    /// At most this many columns (clamped to the tile count).
    Fixed(u32),
}

impl FromStr for ColumnPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "square" => Ok(Self::Auto),
            other => other.parse::<u32>().map(Self::Fixed).map_err(|_| ()),
        }
    }
}

/// Encodings the tileset can be written in. All of them keep the alpha channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Bmp,
    Tga,
}

impl OutputFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
            Self::Tga => "image/x-tga",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tga => "tga",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tga => image::ImageFormat::Tga,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "bmp" => Ok(Self::Bmp),
            "tga" => Ok(Self::Tga),
            _ => Err(()),
        }
    }
}

/// Extraction configuration.
///
/// Defaults match the desktop tool: 16x16 tiles, square-ish PNG output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// How many columns the output grid uses.
    #[serde(default = "default_columns")]
    pub columns: ColumnPolicy,
    /// Encoding of the produced tileset.
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Largest accepted source width or height.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Upper bound on decoder allocations, in bytes.
    #[serde(default = "default_max_alloc_bytes")]
    pub max_alloc_bytes: u64,
    /// Optional wall-clock budget for one extraction (milliseconds). None or 0 disables.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    /// Fingerprint tiles in parallel when feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tile_width: 16,
            tile_height: 16,
            columns: default_columns(),
            output_format: default_output_format(),
            max_dimension: default_max_dimension(),
            max_alloc_bytes: default_max_alloc_bytes(),
            time_budget_ms: None,
            parallel: default_parallel(),
        }
    }
}

impl ExtractConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - A tile dimension is zero
    /// - A tile is larger than the biggest accepted source image
    /// - A fixed column count is zero
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::StackHammerError;

        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(StackHammerError::InvalidConfig(format!(
                "tile size must be non-zero, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }

        if self.max_dimension == 0 {
            return Err(StackHammerError::InvalidConfig(
                "max_dimension must be non-zero".into(),
            ));
        }

        if self.tile_width > self.max_dimension || self.tile_height > self.max_dimension {
            return Err(StackHammerError::InvalidConfig(format!(
                "tile size {}x{} exceeds max_dimension ({})",
                self.tile_width, self.tile_height, self.max_dimension
            )));
        }

        if self.columns == ColumnPolicy::Fixed(0) {
            return Err(StackHammerError::InvalidConfig(
                "fixed column count must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub(crate) fn decode_limits(&self) -> crate::codec::DecodeLimits {
        crate::codec::DecodeLimits {
            max_dimension: self.max_dimension,
            max_alloc_bytes: self.max_alloc_bytes,
        }
    }
}

fn default_columns() -> ColumnPolicy {
    ColumnPolicy::Auto
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Png
}
fn default_max_dimension() -> u32 {
    16_384
}
fn default_max_alloc_bytes() -> u64 {
    512 * 1024 * 1024
}
fn default_parallel() -> bool {
    false
}

/// Builder for `ExtractConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct ExtractConfigBuilder {
    cfg: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ExtractConfig::default(),
        }
    }
    pub fn with_tile_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.tile_width = w;
        self.cfg.tile_height = h;
        self
    }
    pub fn columns(mut self, v: ColumnPolicy) -> Self {
        self.cfg.columns = v;
        self
    }
    pub fn output_format(mut self, v: OutputFormat) -> Self {
        self.cfg.output_format = v;
        self
    }
    pub fn max_dimension(mut self, v: u32) -> Self {
        self.cfg.max_dimension = v;
        self
    }
    pub fn max_alloc_bytes(mut self, v: u64) -> Self {
        self.cfg.max_alloc_bytes = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.cfg.time_budget_ms = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> ExtractConfig {
        self.cfg
    }
}

impl ExtractConfig {
    /// Create a fluent builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }
}
