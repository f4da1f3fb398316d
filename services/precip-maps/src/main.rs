//! Precipitation map generator.
//!
//! Reads the ICON-D2 total precipitation catalog, picks the configured
//! forecast horizons of the latest run and writes one map per horizon.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use precip_maps::{Overrides, Pipeline, PipelineConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "precip-maps")]
#[command(about = "Render ICON-D2 total precipitation forecasts as maps")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "PRECIP_MAPS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory listing of forecast files
    #[arg(long, env = "PRECIP_MAPS_CATALOG_URL")]
    catalog_url: Option<String>,

    /// Directory for rendered images
    #[arg(long, env = "PRECIP_MAPS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Scratch file for the decompressed grid
    #[arg(long)]
    scratch_path: Option<PathBuf>,

    /// Forecast horizons in hours, e.g. 6,12,24,48
    #[arg(long, value_delimiter = ',')]
    horizons: Option<Vec<u32>>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt().with_env_filter(filter).with_target(true);
    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let overrides = Overrides {
        catalog_url: args.catalog_url.clone(),
        output_dir: args.output_dir.clone(),
        scratch_path: args.scratch_path.clone(),
        horizons: args.horizons.clone(),
    };
    let config = PipelineConfig::load(args.config.as_deref(), overrides)?;
    info!(
        catalog = %config.catalog_url,
        horizons = ?config.target_horizons,
        output_dir = %config.output_dir.display(),
        "Starting precipitation map run"
    );

    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run().await?;

    for path in &summary.written {
        info!(path = %path.display(), "Map written");
    }
    if !summary.failed.is_empty() {
        tracing::warn!(failed = summary.failed.len(), "Some entries could not be rendered");
    }

    Ok(())
}
