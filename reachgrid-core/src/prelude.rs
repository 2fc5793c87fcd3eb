pub use crate::MIN_INTERPOLATION_SAMPLES;

// Re-export key components
pub use crate::algo::{Grid, GridSpec, Sample, interpolate};
pub use crate::loading::{GeoJsonProvider, NetworkProvider, ProviderConfig, TileData};
pub use crate::model::{Crs, Facility, RoadGraph, RoadNode};
pub use crate::pipeline::{
    BatchSummary, TileConfig, TileOutcome, TileStatus, process_tile, run_batch,
    run_batch_with,
};
pub use crate::raster::{GeoTransform, write_tile};
pub use crate::routing::{DistanceField, compute_field};
pub use crate::spatial::SpatialIndex;
pub use crate::tiling::{BBox, generate_tiles};

// Core scalar types
pub use crate::Distance; // metres
pub use crate::NodeId;
