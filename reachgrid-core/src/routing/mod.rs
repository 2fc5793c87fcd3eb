//! Shortest-path search over the road graph

pub mod dijkstra;

pub use dijkstra::{DistanceField, compute_field, single_source_distances};
