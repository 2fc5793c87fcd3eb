//! Road network components - nodes and edges

use geo::Point;

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Identifier assigned by the provider, for diagnostics. Providers
    /// without source ids number nodes in insertion order.
    pub id: i64,
    /// Projected node coordinates in metres
    pub geometry: Point<f64>,
}

impl RoadNode {
    pub fn new(id: i64, x: f64, y: f64) -> Self {
        Self {
            id,
            geometry: Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.geometry.x()
    }

    pub fn y(&self) -> f64 {
        self.geometry.y()
    }
}

/// Road graph edge (road segment)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadEdge {
    /// Segment length in metres
    pub length: f64,
}
