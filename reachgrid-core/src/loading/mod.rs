//! This module is responsible for supplying per-tile road networks and
//! facilities to the tile pipeline.

mod config;
mod layers;
mod projection;
mod provider;

pub use config::{DEFAULT_AMENITIES, DEFAULT_HIGHWAYS, ProviderConfig};
pub use projection::UtmProjection;
pub use provider::GeoJsonProvider;

use crate::tiling::BBox;
use crate::{Error, Facility, RoadGraph};

/// Road subgraph and facilities intersecting one tile, in the same
/// projected CRS
#[derive(Debug, Clone)]
pub struct TileData {
    pub graph: RoadGraph,
    pub facilities: Vec<Facility>,
}

/// Source of projected road networks and facility points.
///
/// Implementations are shared read-only across tile workers.
pub trait NetworkProvider {
    /// Fetches the road graph and facilities intersecting `bbox`
    ///
    /// # Errors
    ///
    /// Returns `ProviderFailure` (or another error) when the data cannot be
    /// fetched or parsed
    fn fetch(&self, bbox: &BBox) -> Result<TileData, Error>;
}
