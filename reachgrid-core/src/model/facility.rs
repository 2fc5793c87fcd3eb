use geo::Point;

/// A point of interest acting as a shortest-path source, e.g. a hospital.
/// Coordinates are in the same projection as the road graph of the tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub geometry: Point<f64>,
    pub name: Option<String>,
    pub amenity: Option<String>,
}

impl Facility {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            geometry: Point::new(x, y),
            name: None,
            amenity: None,
        }
    }

    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.amenity.as_deref())
            .unwrap_or("unnamed facility")
    }
}
