//! Data model for accessibility computation
//!
//! Contains the projected road network, facility points and the
//! coordinate reference system they share.

pub mod crs;
pub mod facility;
pub mod streets;

pub use crs::Crs;
pub use facility::Facility;
pub use streets::{RoadEdge, RoadGraph, RoadNode};
