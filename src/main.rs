use std::process::ExitCode;

use clap::Parser;
use reachgrid_core::loading::GeoJsonProvider;
use reachgrid_core::pipeline::{BatchSummary, run_batch_with};
use reachgrid_core::tiling::generate_tiles;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;

use cli::Cli;
use config::{Config, ConfigError};

/// Failures that stop the run before any tile is processed
#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to load input layers: {0}")]
    Input(#[from] reachgrid_core::Error),
    #[error("Failed to start the batch: {0}")]
    Batch(reachgrid_core::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(&cli) {
        Ok(summary) => {
            info!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<BatchSummary, RunError> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli)?;
    config.validate()?;

    let region = config.region();
    let tiles = generate_tiles(region, config.tile_size);
    info!(
        "Covering [{}, {}, {}, {}] with {} tiles of {} degrees, cutoff {} m, {} px",
        region.min_lon,
        region.min_lat,
        region.max_lon,
        region.max_lat,
        tiles.len(),
        config.tile_size,
        config.cutoff,
        config.resolution
    );

    let provider = GeoJsonProvider::load(&config.provider_config())?;
    // Every outcome is already logged by the pipeline, only the counts are kept
    run_batch_with(tiles, &provider, &config.tile_config(), |_| {}).map_err(RunError::Batch)
}
