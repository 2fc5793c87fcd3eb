use std::fs;
use std::path::{Path, PathBuf};

use reachgrid_core::MIN_INTERPOLATION_SAMPLES;
use reachgrid_core::loading::{DEFAULT_AMENITIES, DEFAULT_HIGHWAYS, ProviderConfig};
use reachgrid_core::pipeline::TileConfig;
use reachgrid_core::tiling::{BBox, count_tiles};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::cli::Cli;

/// Upper bound on the number of tiles a single run may cover
pub const MAX_TILES: usize = 10_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Batch settings, read from TOML and overlaid by command line flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `[min_lon, min_lat, max_lon, max_lat]` in degrees
    pub region: [f64; 4],
    /// Tile edge length in degrees
    pub tile_size: f64,
    /// Maximum network distance in metres
    pub cutoff: f64,
    /// Raster cells per tile side
    pub resolution: usize,
    pub output_dir: PathBuf,
    pub min_samples: usize,
    /// 0 lets rayon pick
    pub workers: usize,
    pub roads: PathBuf,
    pub facilities: PathBuf,
    pub amenities: Vec<String>,
    pub highways: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: [-125.0, 24.0, -66.0, 50.0],
            tile_size: 1.0,
            cutoff: 50_000.0,
            resolution: 200,
            output_dir: PathBuf::from("./access_tiles"),
            min_samples: MIN_INTERPOLATION_SAMPLES,
            workers: 0,
            roads: PathBuf::from("roads.geojson"),
            facilities: PathBuf::from("facilities.geojson"),
            amenities: DEFAULT_AMENITIES.iter().map(ToString::to_string).collect(),
            highways: DEFAULT_HIGHWAYS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Config {
    /// Reads `path`, or falls back to defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overlays the flags given on the command line
    pub fn apply_overrides(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(region) = &cli.region {
            self.region = region.as_slice().try_into().map_err(|_| {
                ConfigError::Invalid(format!("region needs 4 values, got {}", region.len()))
            })?;
        }
        if let Some(tile_size) = cli.tile_size {
            self.tile_size = tile_size;
        }
        if let Some(cutoff) = cli.cutoff {
            self.cutoff = cutoff;
        }
        if let Some(resolution) = cli.resolution {
            self.resolution = resolution;
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(roads) = &cli.roads {
            self.roads.clone_from(roads);
        }
        if let Some(facilities) = &cli.facilities {
            self.facilities.clone_from(facilities);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [min_lon, min_lat, max_lon, max_lat] = self.region;
        if self.region.iter().any(|v| !v.is_finite()) {
            return Err(invalid("region bounds must be finite"));
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(invalid("region minimum must be below its maximum"));
        }
        if min_lon < -180.0 || max_lon > 180.0 {
            return Err(invalid("region longitudes must lie within [-180, 180]"));
        }
        if min_lat < -90.0 || max_lat > 90.0 {
            return Err(invalid("region latitudes must lie within [-90, 90]"));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(invalid("tile_size must be positive"));
        }
        match count_tiles(&self.region(), self.tile_size) {
            Some(count) if count <= MAX_TILES => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "tile_size {} splits the region into more than {MAX_TILES} tiles",
                    self.tile_size
                )));
            }
        }
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(invalid("cutoff must be positive"));
        }
        if self.resolution == 0 {
            return Err(invalid("resolution must be positive"));
        }
        if self.min_samples < 3 {
            return Err(invalid("min_samples must be at least 3"));
        }
        for path in [&self.roads, &self.facilities] {
            if !path.is_file() {
                return Err(ConfigError::Invalid(format!(
                    "input file '{}' does not exist",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn region(&self) -> BBox {
        let [min_lon, min_lat, max_lon, max_lat] = self.region;
        BBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    pub fn tile_config(&self) -> TileConfig {
        TileConfig {
            output_dir: self.output_dir.clone(),
            cutoff: self.cutoff,
            resolution: self.resolution,
            min_samples: self.min_samples,
            workers: self.workers,
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            roads_path: self.roads.clone(),
            facilities_path: self.facilities.clone(),
            amenities: self.amenities.clone(),
            highways: self.highways.clone(),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn with_inputs(dir: &Path) -> Config {
        let roads = dir.join("roads.geojson");
        let facilities = dir.join("facilities.geojson");
        fs::write(&roads, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        fs::write(&facilities, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        Config {
            roads,
            facilities,
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.region(), BBox::new(-125.0, 24.0, -66.0, 50.0));
        assert_eq!(config.tile_config().cutoff, 50_000.0);
        assert_eq!(config.tile_config().resolution, 200);
        assert_eq!(config.output_dir, PathBuf::from("./access_tiles"));
        assert_eq!(config.amenities, vec!["hospital", "clinic"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reachgrid.toml");
        fs::write(
            &path,
            "region = [5.0, 45.0, 10.0, 48.0]\ncutoff = 25000.0\namenities = [\"hospital\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();

        assert_eq!(config.region, [5.0, 45.0, 10.0, 48.0]);
        assert_eq!(config.cutoff, 25_000.0);
        assert_eq!(config.amenities, vec!["hospital"]);
        assert_eq!(config.tile_size, 1.0);
        assert_eq!(config.resolution, 200);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reachgrid.toml");
        fs::write(&path, "tile_sise = 0.5\n").unwrap();

        assert!(matches!(
            Config::load(Some(path.as_path())),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/reachgrid.toml")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();
        let cli = Cli::parse_from([
            "reachgrid",
            "--region",
            "-10",
            "35",
            "5",
            "44",
            "--cutoff",
            "1000",
            "--output-dir",
            "/tmp/tiles",
            "--workers",
            "4",
        ]);

        config.apply_overrides(&cli).unwrap();

        assert_eq!(config.region, [-10.0, 35.0, 5.0, 44.0]);
        assert_eq!(config.cutoff, 1000.0);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/tiles"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.resolution, 200);
    }

    #[test]
    fn test_validation() {
        let dir = tempfile::tempdir().unwrap();
        let valid = with_inputs(dir.path());
        assert!(valid.validate().is_ok());

        let cases = [
            Config {
                region: [10.0, 0.0, 5.0, 1.0],
                ..valid.clone()
            },
            Config {
                region: [0.0, 0.0, 190.0, 1.0],
                ..valid.clone()
            },
            Config {
                region: [0.0, -95.0, 1.0, 1.0],
                ..valid.clone()
            },
            Config {
                region: [0.0, 0.0, f64::NAN, 1.0],
                ..valid.clone()
            },
            Config {
                tile_size: 0.0,
                ..valid.clone()
            },
            Config {
                tile_size: 1e-10,
                ..valid.clone()
            },
            Config {
                tile_size: 0.001,
                ..valid.clone()
            },
            Config {
                cutoff: -1.0,
                ..valid.clone()
            },
            Config {
                resolution: 0,
                ..valid.clone()
            },
            Config {
                min_samples: 2,
                ..valid.clone()
            },
            Config {
                roads: dir.path().join("missing.geojson"),
                ..valid.clone()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{config:?} should be rejected"
            );
        }
    }
}
