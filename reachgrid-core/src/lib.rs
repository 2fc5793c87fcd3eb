//! Batch computation of driving-distance-to-nearest-facility rasters.
//!
//! A region is cut into tiles. For every tile the road network and the
//! facilities intersecting it are fetched from a [`loading::NetworkProvider`],
//! facilities are snapped to their nearest road nodes, a multi-source
//! Dijkstra search produces a sparse distance field over the nodes, and the
//! field is interpolated into a dense grid written as a GeoTIFF.

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod raster;
pub mod routing;
pub mod spatial;
pub mod tiling;

pub use error::Error;
pub use model::{Crs, Facility, RoadEdge, RoadGraph, RoadNode};

/// Identifier of a node within one tile's road graph
pub type NodeId = petgraph::graph::NodeIndex;

/// Distance in metres
pub type Distance = f64;

/// Minimum number of samples the interpolator accepts by default
pub const MIN_INTERPOLATION_SAMPLES: usize = 10;
