use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Driving distance to the nearest facility, rendered as GeoTIFF tiles",
    long_about = None
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Region to cover (overrides config)
    #[arg(
        long,
        num_args = 4,
        allow_negative_numbers = true,
        value_names = ["MIN_LON", "MIN_LAT", "MAX_LON", "MAX_LAT"]
    )]
    pub region: Option<Vec<f64>>,

    /// Tile edge length in degrees (overrides config)
    #[arg(long)]
    pub tile_size: Option<f64>,

    /// Maximum network distance in metres (overrides config)
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Raster cells per tile side (overrides config)
    #[arg(long)]
    pub resolution: Option<usize>,

    /// Directory receiving the tiles (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Worker threads, 0 uses every core (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Road network GeoJSON (overrides config)
    #[arg(long)]
    pub roads: Option<PathBuf>,

    /// Facility GeoJSON (overrides config)
    #[arg(long)]
    pub facilities: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
