mod multi_source;
mod state;

pub use multi_source::{DistanceField, compute_field, single_source_distances};
