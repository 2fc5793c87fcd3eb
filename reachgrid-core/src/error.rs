use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No nodes available for spatial indexing")]
    NoPointsFound,
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
    #[error("Insufficient samples for interpolation: got {found}, need at least {required}")]
    InsufficientSamples { found: usize, required: usize },
    #[error("Samples do not span an area")]
    DegenerateSamples,
    #[error("No facilities intersect the tile")]
    NoFacilitiesInTile,
    #[error("Road network provider failed: {0}")]
    ProviderFailure(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Raster error: {0}")]
    RasterError(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}

impl From<tiff::TiffError> for Error {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => Error::IoError(e),
            other => Error::RasterError(other.to_string()),
        }
    }
}
