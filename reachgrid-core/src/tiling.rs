//! Partitioning of a region into fixed size tiles

use std::path::{Path, PathBuf};

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// A longitude/latitude bounding box in degrees (WGS 84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Longitude and latitude of the centre point
    pub fn centre(&self) -> (f64, f64) {
        (
            self.min_lon + (self.max_lon - self.min_lon) / 2.0,
            self.min_lat + (self.max_lat - self.min_lat) / 2.0,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }

    /// Tile identifier derived from the south-west corner, e.g. `-125.00_24.00`.
    ///
    /// Two decimals are used down to 0.02 degree tiles. Smaller tiles get as
    /// many decimals as needed for neighbouring corners to stay distinct.
    pub fn tile_name(&self) -> String {
        let precision = name_precision(self.max_lon - self.min_lon, self.max_lat - self.min_lat);
        format!(
            "{:.*}_{:.*}",
            precision, self.min_lon, precision, self.min_lat
        )
    }

    /// Output file of this tile inside `dir`
    pub fn tile_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.tif", self.tile_name()))
    }
}

const MIN_NAME_DECIMALS: usize = 2;
const MAX_NAME_DECIMALS: usize = 12;

/// Decimals at which corners `size` apart round to different values: the
/// rounding step must not exceed half the tile size.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn name_precision(width: f64, height: f64) -> usize {
    let size = width.min(height);
    if !(size.is_finite() && size > 0.0) {
        return MIN_NAME_DECIMALS;
    }
    let decimals = (-(size / 2.0).log10() - 1e-9).ceil().max(0.0) as usize;
    decimals.clamp(MIN_NAME_DECIMALS, MAX_NAME_DECIMALS)
}

/// Lazy, finite iterator over the tiles covering a region.
///
/// Tiles are offered row by row from the southern edge, west to east within
/// a row. Corners are computed as `min + i * tile_size`, so the sequence is
/// fully determined by the region and tile size.
///
/// A region whose tile count does not fit in `usize` yields no tiles; check
/// it up front with [`count_tiles`].
#[derive(Debug, Clone)]
pub struct TileIter {
    region: BBox,
    tile_size: f64,
    columns: usize,
    total: usize,
    next: usize,
}

impl TileIter {
    pub fn new(region: BBox, tile_size: f64) -> Self {
        let (columns, total) = match grid_shape(&region, tile_size) {
            Some((columns, rows)) => (columns, columns.checked_mul(rows).unwrap_or(0)),
            None => (0, 0),
        };

        Self {
            region,
            tile_size,
            columns,
            total,
            next: 0,
        }
    }

    /// Total number of tiles, including those already yielded
    pub fn total(&self) -> usize {
        self.total
    }

    fn tile_at(&self, row: usize, col: usize) -> BBox {
        let min_lon = self.region.min_lon + col as f64 * self.tile_size;
        let min_lat = self.region.min_lat + row as f64 * self.tile_size;
        BBox::new(
            min_lon,
            min_lat,
            min_lon + self.tile_size,
            min_lat + self.tile_size,
        )
    }
}

impl Iterator for TileIter {
    type Item = BBox;

    fn next(&mut self) -> Option<BBox> {
        if self.next >= self.total() {
            return None;
        }
        let (row, col) = (self.next / self.columns, self.next % self.columns);
        self.next += 1;
        Some(self.tile_at(row, col))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileIter {}

/// Number of tiles needed along a span. The small tolerance keeps spans such
/// as `0.3 / 0.1` from producing an extra sliver tile. `None` when the count
/// does not fit in `usize`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn tile_count(span: f64, tile_size: f64) -> Option<usize> {
    if !(tile_size > 0.0 && span > 0.0 && span.is_finite()) {
        return Some(0);
    }
    let count = (span / tile_size - 1e-9).ceil();
    (count.is_finite() && count < usize::MAX as f64).then_some(count as usize)
}

/// Columns and rows covering `region`
fn grid_shape(region: &BBox, tile_size: f64) -> Option<(usize, usize)> {
    let columns = tile_count(region.max_lon - region.min_lon, tile_size)?;
    let rows = tile_count(region.max_lat - region.min_lat, tile_size)?;
    Some((columns, rows))
}

/// Number of tiles covering `region`, `None` if it overflows `usize`
pub fn count_tiles(region: &BBox, tile_size: f64) -> Option<usize> {
    let (columns, rows) = grid_shape(region, tile_size)?;
    columns.checked_mul(rows)
}

/// Tiles covering `region` with `tile_size` degree cells
pub fn generate_tiles(region: BBox, tile_size: f64) -> TileIter {
    TileIter::new(region, tile_size)
}
