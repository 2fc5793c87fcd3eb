//! Minimal GeoTIFF encoding: one `Float32` band, pixel-is-area raster with
//! a scale + tiepoint transform and an EPSG coded CRS.

use std::io::{Seek, Write};

use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

use super::GeoTransform;
use crate::Error;
use crate::algo::Grid;
use crate::model::Crs;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Encodes `grid` as GeoTIFF into `writer`. No-data cells are written as
/// `NaN` and advertised through the `GDAL_NODATA` tag.
///
/// # Errors
///
/// Returns `RasterError` or `IoError` if encoding fails
pub fn encode_geotiff<W: Write + Seek>(
    writer: W,
    grid: &Grid,
    transform: &GeoTransform,
    crs: Crs,
) -> Result<(), Error> {
    let width = u32::try_from(grid.width())
        .map_err(|_| Error::RasterError(format!("grid width {} too large", grid.width())))?;
    let height = u32::try_from(grid.height())
        .map_err(|_| Error::RasterError(format!("grid height {} too large", grid.height())))?;

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(width, height)?;

    let pixel_scale = [transform.pixel_width, transform.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
    let geo_keys = geo_key_directory(crs);

    let directory = image.encoder();
    directory.write_tag(Tag::ModelPixelScaleTag, &pixel_scale[..])?;
    directory.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    directory.write_tag(Tag::GeoKeyDirectoryTag, &geo_keys[..])?;
    directory.write_tag(Tag::GdalNodata, "nan")?;

    #[allow(clippy::cast_possible_truncation)]
    let data: Vec<f32> = grid.values().iter().map(|v| *v as f32).collect();
    image.write_data(&data)?;

    Ok(())
}

/// GeoKey directory: header followed by (key, location, count, value)
/// entries sorted by key
#[rustfmt::skip]
fn geo_key_directory(crs: Crs) -> Vec<u16> {
    let (model_type, crs_key) = if crs.is_projected() {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_KEY)
    } else {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_KEY)
    };

    vec![
        1, 1, 0, 3, // version 1.1.0, three keys
        GT_MODEL_TYPE_KEY, 0, 1, model_type,
        GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key, 0, 1, crs.epsg(),
    ]
}
