pub mod interpolation;

pub use interpolation::{Grid, GridSpec, Sample, interpolate};
