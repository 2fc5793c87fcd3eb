//! Per-tile processing: fetch, snap, search, interpolate, write.

mod batch;

use std::fmt;
use std::path::PathBuf;

use log::{debug, error, info, warn};

pub use batch::{BatchSummary, run_batch, run_batch_with};

use crate::algo::{GridSpec, Sample, interpolate};
use crate::loading::NetworkProvider;
use crate::raster::{GeoTransform, WriteStatus, write_tile};
use crate::routing::compute_field;
use crate::spatial::SpatialIndex;
use crate::tiling::BBox;
use crate::{Distance, Error, MIN_INTERPOLATION_SAMPLES, NodeId};

/// Parameters shared by every tile of a batch
#[derive(Debug, Clone)]
pub struct TileConfig {
    pub output_dir: PathBuf,
    /// Maximum network distance in metres
    pub cutoff: Distance,
    /// Raster cells per side
    pub resolution: usize,
    pub min_samples: usize,
    /// Worker threads, 0 picks the rayon default
    pub workers: usize,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./access_tiles"),
            cutoff: 50_000.0,
            resolution: 200,
            min_samples: MIN_INTERPOLATION_SAMPLES,
            workers: 0,
        }
    }
}

/// Terminal state of a tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileStatus {
    SkippedExists,
    SkippedNoFacilities,
    SkippedInsufficientData,
    Written,
    Failed(String),
}

impl TileStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, TileStatus::Failed(_))
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileStatus::SkippedExists => write!(f, "skipped (exists)"),
            TileStatus::SkippedNoFacilities => write!(f, "skipped (no facilities)"),
            TileStatus::SkippedInsufficientData => write!(f, "skipped (insufficient data)"),
            TileStatus::Written => write!(f, "written"),
            TileStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileOutcome {
    pub tile: BBox,
    pub status: TileStatus,
}

/// Runs one tile to a terminal state. Never panics on data errors: every
/// error is turned into a status and logged with the tile name.
pub fn process_tile<P>(tile: &BBox, provider: &P, config: &TileConfig) -> TileStatus
where
    P: NetworkProvider + ?Sized,
{
    let status = match try_process_tile(tile, provider, config) {
        Ok(status) => status,
        Err(Error::NoFacilitiesInTile) => TileStatus::SkippedNoFacilities,
        Err(Error::InsufficientSamples { found, required }) => {
            debug!(
                "Tile {}: {found} samples, {required} required",
                tile.tile_name()
            );
            TileStatus::SkippedInsufficientData
        }
        Err(Error::DegenerateSamples) => TileStatus::SkippedInsufficientData,
        Err(e) => TileStatus::Failed(e.to_string()),
    };

    if status.is_failed() {
        error!("{} -> {status}", tile.tile_name());
    } else {
        info!("{} -> {status}", tile.tile_name());
    }
    status
}

fn try_process_tile<P>(
    tile: &BBox,
    provider: &P,
    config: &TileConfig,
) -> Result<TileStatus, Error>
where
    P: NetworkProvider + ?Sized,
{
    let path = tile.tile_path(&config.output_dir);
    if path.exists() {
        return Ok(TileStatus::SkippedExists);
    }

    let data = provider.fetch(tile)?;
    if data.facilities.is_empty() {
        return Err(Error::NoFacilitiesInTile);
    }

    let graph = &data.graph;
    let index = SpatialIndex::build(graph.nodes().map(|(id, node)| (id, node.x(), node.y())))?;

    let mut sources: Vec<NodeId> = Vec::with_capacity(data.facilities.len());
    for facility in &data.facilities {
        let (x, y) = (facility.geometry.x(), facility.geometry.y());
        if let Some((node, distance)) = index.nearest_with_distance(x, y) {
            if distance > config.cutoff {
                warn!(
                    "Tile {}: facility '{}' is {distance:.0} m from the road network",
                    tile.tile_name(),
                    facility.label()
                );
            }
            sources.push(node);
        }
    }

    let field = compute_field(graph, &sources, config.cutoff)?;
    debug!(
        "Tile {}: {} sources reach {} of {} nodes",
        tile.tile_name(),
        sources.len(),
        field.len(),
        graph.node_count()
    );

    let samples: Vec<Sample> = field
        .sorted()
        .into_iter()
        .filter_map(|(id, distance)| {
            graph
                .node(id)
                .map(|node| Sample::new(node.x(), node.y(), distance))
        })
        .collect();

    if samples.len() < config.min_samples {
        return Err(Error::InsufficientSamples {
            found: samples.len(),
            required: config.min_samples,
        });
    }

    let spec = GridSpec::from_samples(&samples, config.resolution)?;
    let grid = interpolate(&samples, &spec, config.min_samples)?;
    if grid.defined_cells() == 0 {
        return Ok(TileStatus::SkippedInsufficientData);
    }

    let transform = GeoTransform::from_grid_spec(&spec);
    match write_tile(&path, &grid, &transform, graph.crs())? {
        WriteStatus::Written => Ok(TileStatus::Written),
        WriteStatus::AlreadyExists => Ok(TileStatus::SkippedExists),
    }
}
