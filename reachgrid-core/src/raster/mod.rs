//! Georeferenced raster output

mod geotiff;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

pub use geotiff::encode_geotiff;

use crate::Error;
use crate::algo::{Grid, GridSpec};
use crate::model::Crs;

/// North-up affine transform: top-left corner and pixel size in CRS units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_grid_spec(spec: &GridSpec) -> Self {
        Self {
            origin_x: spec.origin_x,
            origin_y: spec.max_y(),
            pixel_width: spec.pixel_width(),
            pixel_height: spec.pixel_height(),
        }
    }

    /// GDAL ordering: `[origin_x, pixel_width, 0, origin_y, 0, -pixel_height]`
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            -self.pixel_height,
        ]
    }
}

/// Result of an atomic tile write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// Another writer finished the same file first; nothing was changed
    AlreadyExists,
}

/// Writes `grid` as a single band GeoTIFF at `path`.
///
/// The image is encoded into a temporary file next to `path` and renamed
/// into place only if `path` does not exist yet, so a partially written
/// tile is never visible under its final name.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the file
/// cannot be encoded or persisted
pub fn write_tile(
    path: &Path,
    grid: &Grid,
    transform: &GeoTransform,
    crs: Crs,
) -> Result<WriteStatus, Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".reachgrid-")
        .suffix(".partial")
        .tempfile_in(dir)?;

    encode_geotiff(temp.as_file_mut(), grid, transform, crs)?;
    temp.as_file().sync_all()?;

    match temp.persist_noclobber(path) {
        Ok(_) => Ok(WriteStatus::Written),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            debug!(
                "{} appeared while encoding, discarding duplicate",
                path.display()
            );
            Ok(WriteStatus::AlreadyExists)
        }
        Err(e) => Err(Error::IoError(e.error)),
    }
}
