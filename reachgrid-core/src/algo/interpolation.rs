//! Scattered-data interpolation of a sparse distance field onto a regular
//! grid.
//!
//! Samples are triangulated (Delaunay) and every grid cell centre is
//! evaluated with Sibson's C1 natural neighbour interpolant, using per-sample
//! gradients estimated from the Delaunay neighbourhood. Cells outside the
//! convex hull of the samples have no data: the interpolant never
//! extrapolates beyond sampled coverage.

use hashbrown::HashMap;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::Error;

/// Controls how quickly the C1 interpolant flattens around samples
const GRADIENT_FLATNESS: f64 = 0.5;

/// A location carrying a scalar value, in projected metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}

/// Regular grid covering `[origin_x, origin_x + extent_x] x
/// [origin_y, origin_y + extent_y]` with `resolution` cells per side.
/// The origin is the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub origin_x: f64,
    pub origin_y: f64,
    pub extent_x: f64,
    pub extent_y: f64,
    pub resolution: usize,
}

impl GridSpec {
    /// Grid spanning the bounding box of `samples`
    ///
    /// # Errors
    ///
    /// * `InvalidData` if `resolution` is zero or `samples` is empty
    /// * `DegenerateSamples` if the samples share an x or y coordinate
    pub fn from_samples(samples: &[Sample], resolution: usize) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::InvalidData("no samples to derive a grid from".into()));
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for sample in samples {
            min_x = min_x.min(sample.x);
            min_y = min_y.min(sample.y);
            max_x = max_x.max(sample.x);
            max_y = max_y.max(sample.y);
        }

        if max_x - min_x <= 0.0 || max_y - min_y <= 0.0 {
            return Err(Error::DegenerateSamples);
        }

        let spec = Self {
            origin_x: min_x,
            origin_y: min_y,
            extent_x: max_x - min_x,
            extent_y: max_y - min_y,
            resolution,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn pixel_width(&self) -> f64 {
        self.extent_x / self.resolution as f64
    }

    pub fn pixel_height(&self) -> f64 {
        self.extent_y / self.resolution as f64
    }

    /// Northern edge of the grid
    pub fn max_y(&self) -> f64 {
        self.origin_y + self.extent_y
    }

    /// Centre of the cell at `row` (0 = northernmost) and `col`
    /// (0 = westernmost)
    pub fn cell_centre(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width();
        let y = self.max_y() - (row as f64 + 0.5) * self.pixel_height();
        (x, y)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.resolution == 0 {
            return Err(Error::InvalidData("grid resolution must be positive".into()));
        }
        let finite = [self.origin_x, self.origin_y, self.extent_x, self.extent_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.extent_x <= 0.0 || self.extent_y <= 0.0 {
            return Err(Error::InvalidData(format!(
                "grid extent must be finite and positive, got {} x {}",
                self.extent_x, self.extent_y
            )));
        }
        Ok(())
    }
}

/// Dense row-major grid, row 0 is the northern edge. `NaN` marks cells
/// without data.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value of a cell, `None` for no-data cells and out of range indices
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let value = self.values[row * self.width + col];
        (!value.is_nan()).then_some(value)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn defined_cells(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

#[derive(Debug, Clone, Copy)]
struct SampleVertex {
    position: Point2<f64>,
    value: f64,
    gradient: [f64; 2],
}

impl HasPosition for SampleVertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Interpolates `samples` onto the grid described by `spec`.
///
/// # Errors
///
/// * `InsufficientSamples` if fewer than `min_samples` samples are given
/// * `InvalidData` for non-finite samples or an invalid grid
/// * `DegenerateSamples` if the samples do not span a triangle
pub fn interpolate(samples: &[Sample], spec: &GridSpec, min_samples: usize) -> Result<Grid, Error> {
    if samples.len() < min_samples {
        return Err(Error::InsufficientSamples {
            found: samples.len(),
            required: min_samples,
        });
    }
    spec.validate()?;

    let mut triangulation: DelaunayTriangulation<SampleVertex> =
        DelaunayTriangulation::bulk_load(merge_coincident(samples)?)
            .map_err(|e| Error::InvalidData(format!("failed to triangulate samples: {e:?}")))?;

    if triangulation.num_inner_faces() == 0 {
        return Err(Error::DegenerateSamples);
    }

    estimate_gradients(&mut triangulation);

    let width = spec.resolution;
    let mut values = vec![f64::NAN; width * width];
    let nn = triangulation.natural_neighbor();
    for (row, cells) in values.chunks_mut(width).enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            let (x, y) = spec.cell_centre(row, col);
            if let Some(value) = nn.interpolate_gradient(
                |v| v.data().value,
                |v| v.data().gradient,
                GRADIENT_FLATNESS,
                Point2::new(x, y),
            ) {
                // The smooth interpolant may overshoot below zero near
                // facilities
                *cell = value.max(0.0);
            }
        }
    }

    Ok(Grid {
        width,
        height: width,
        values,
    })
}

/// Rejects non-finite input and merges samples sharing a position, keeping the
/// smallest value
fn merge_coincident(samples: &[Sample]) -> Result<Vec<SampleVertex>, Error> {
    let mut by_position: HashMap<(u64, u64), usize> = HashMap::with_capacity(samples.len());
    let mut vertices: Vec<SampleVertex> = Vec::with_capacity(samples.len());

    for sample in samples {
        if !(sample.x.is_finite() && sample.y.is_finite() && sample.value.is_finite()) {
            return Err(Error::InvalidData(format!(
                "non-finite sample ({}, {}) = {}",
                sample.x, sample.y, sample.value
            )));
        }

        // Adding 0.0 folds -0.0 into 0.0
        let key = ((sample.x + 0.0).to_bits(), (sample.y + 0.0).to_bits());
        match by_position.entry(key) {
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(vertices.len());
                vertices.push(SampleVertex {
                    position: Point2::new(sample.x, sample.y),
                    value: sample.value,
                    gradient: [0.0, 0.0],
                });
            }
            hashbrown::hash_map::Entry::Occupied(entry) => {
                let vertex = &mut vertices[*entry.get()];
                vertex.value = vertex.value.min(sample.value);
            }
        }
    }

    Ok(vertices)
}

/// Least-squares plane fit through each vertex and its Delaunay neighbours
fn estimate_gradients(triangulation: &mut DelaunayTriangulation<SampleVertex>) {
    let gradients: Vec<_> = triangulation
        .vertices()
        .map(|vertex| {
            let origin = vertex.position();
            let value = vertex.data().value;

            let (mut sxx, mut sxy, mut syy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for edge in vertex.out_edges() {
                let neighbour = edge.to();
                let dx = neighbour.position().x - origin.x;
                let dy = neighbour.position().y - origin.y;
                let dz = neighbour.data().value - value;
                sxx += dx * dx;
                sxy += dx * dy;
                syy += dy * dy;
                sxz += dx * dz;
                syz += dy * dz;
            }

            let det = sxx * syy - sxy * sxy;
            let gradient = if det.abs() <= f64::EPSILON * (sxx * syy).max(1.0) {
                [0.0, 0.0]
            } else {
                [(sxz * syy - syz * sxy) / det, (syz * sxx - sxz * sxy) / det]
            };

            (vertex.fix(), gradient)
        })
        .collect();

    for (handle, gradient) in gradients {
        triangulation.vertex_data_mut(handle).gradient = gradient;
    }
}
