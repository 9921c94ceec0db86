use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use stackhammer_core::prelude::*;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "stackhammer",
    about = "Extract a deduplicated tileset from a screenshot or sprite sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the tileset and save it
    Extract(ExtractArgs),
    /// Extract without writing anything and print statistics
    Stats(ExtractArgs),
}

#[derive(Parser, Debug, Clone)]
struct ExtractArgs {
    // Input/Output
    /// Input image, or a text file holding a `data:` URL
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output tileset path
    #[arg(short, long, default_value = DEFAULT_FILE_NAME, help_heading = "Input/Output")]
    out: PathBuf,
    /// Also write the JSON tile map to this path
    #[arg(long, help_heading = "Input/Output")]
    metadata: Option<PathBuf>,
    /// YAML config file path (present keys override command-line options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Print the tileset as a `data:` URL on stdout
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    data_url: bool,

    // Tiles
    /// Tile width and height in one value
    #[arg(long, help_heading = "Tiles")]
    tile_size: Option<u32>,
    /// Tile width (overrides --tile-size)
    #[arg(long, help_heading = "Tiles")]
    tile_width: Option<u32>,
    /// Tile height (overrides --tile-size)
    #[arg(long, help_heading = "Tiles")]
    tile_height: Option<u32>,

    // Layout
    /// Tileset columns: auto | N
    #[arg(long, default_value = "auto", help_heading = "Layout")]
    columns: String,
    /// Output encoding: png | bmp | tga
    #[arg(long, default_value = "png", help_heading = "Layout")]
    format: String,

    // Limits
    /// Largest accepted source width/height
    #[arg(long, default_value_t = 16384, help_heading = "Limits")]
    max_dimension: u32,
    /// Upper bound on decoder allocations, in bytes
    #[arg(long, default_value_t = 512 * 1024 * 1024, help_heading = "Limits")]
    max_alloc_bytes: u64,
    /// Abort extraction after this many milliseconds
    #[arg(long, help_heading = "Limits")]
    time_budget: Option<u64>,
    /// Fingerprint tiles in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Limits")]
    parallel: bool,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: extract and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Stats(args) => {
            let mut a = args.clone();
            a.dry_run = true;
            run_extract(&a)
        }
    }
}

fn run_extract(cli: &ExtractArgs) -> anyhow::Result<()> {
    let mut cfg = config_from_args(cli)?;
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_extract_config(cfg)?;
    }
    cfg.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let input = fs::read(&cli.input).with_context(|| format!("read {}", cli.input.display()))?;
    let engine = Engine::new(cfg);
    let start = Instant::now();
    let tileset = if looks_like_data_url(&input) {
        let text = std::str::from_utf8(&input)
            .with_context(|| format!("{} is not valid UTF-8", cli.input.display()))?;
        engine.extract_data_url(text)?;
        engine.current()?
    } else {
        engine.extract_bytes(&input)?
    };
    let elapsed = start.elapsed();

    let stats = tileset.stats();
    info!(
        source_tiles = stats.source_tiles,
        unique_tiles = stats.unique_tiles,
        width = tileset.width(),
        height = tileset.height(),
        time = %fmt_dur(elapsed),
        "extracted tileset"
    );
    println!("{}", stats.summary());

    if cli.data_url {
        println!("{}", tileset.to_data_url());
    }
    if cli.dry_run {
        return Ok(());
    }

    let saved = match &cli.metadata {
        Some(meta) => engine.save_with_metadata(&cli.out, meta),
        None => engine.save(&cli.out),
    }
    .with_context(|| format!("write {}", cli.out.display()))?;
    info!(path = ?saved.path, bytes = saved.bytes_written, "tileset written");
    if let Some(meta) = &saved.metadata_path {
        info!(path = ?meta, "tile map written");
    }
    Ok(())
}

fn config_from_args(cli: &ExtractArgs) -> anyhow::Result<ExtractConfig> {
    let size = cli.tile_size.unwrap_or(16);
    Ok(ExtractConfig {
        tile_width: cli.tile_width.unwrap_or(size),
        tile_height: cli.tile_height.unwrap_or(size),
        columns: parse_columns(&cli.columns)?,
        output_format: parse_format(&cli.format)?,
        max_dimension: cli.max_dimension,
        max_alloc_bytes: cli.max_alloc_bytes,
        time_budget_ms: cli.time_budget,
        parallel: cli.parallel,
        ..Default::default()
    })
}

fn looks_like_data_url(bytes: &[u8]) -> bool {
    let start = bytes.trim_ascii_start();
    start.len() >= 5 && start[..5].eq_ignore_ascii_case(b"data:")
}

fn parse_columns(s: &str) -> anyhow::Result<ColumnPolicy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown column policy: {} (expected auto or a number)", s))
}

fn parse_format(s: &str) -> anyhow::Result<OutputFormat> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown output format: {} (expected png, bmp or tga)", s))
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}µs", d.as_micros())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    tile_size: Option<u32>,
    tile_width: Option<u32>,
    tile_height: Option<u32>,
    columns: Option<String>,
    output_format: Option<String>,
    max_dimension: Option<u32>,
    max_alloc_bytes: Option<u64>,
    time_budget_ms: Option<u64>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_extract_config(self, mut cfg: ExtractConfig) -> anyhow::Result<ExtractConfig> {
        if let Some(v) = self.tile_size {
            cfg.tile_width = v;
            cfg.tile_height = v;
        }
        if let Some(v) = self.tile_width {
            cfg.tile_width = v;
        }
        if let Some(v) = self.tile_height {
            cfg.tile_height = v;
        }
        if let Some(v) = self.columns {
            cfg.columns = parse_columns(&v)?;
        }
        if let Some(v) = self.output_format {
            cfg.output_format = parse_format(&v)?;
        }
        if let Some(v) = self.max_dimension {
            cfg.max_dimension = v;
        }
        if let Some(v) = self.max_alloc_bytes {
            cfg.max_alloc_bytes = v;
        }
        if let Some(v) = self.time_budget_ms {
            cfg.time_budget_ms = Some(v);
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}
