use std::fmt;

/// Coordinate reference system identified by its EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Projected system with coordinates in metres (e.g. UTM)
    Projected(u16),
    /// Geographic system with coordinates in degrees
    Geographic(u16),
}

impl Crs {
    pub const WGS84: Crs = Crs::Geographic(4326);

    /// WGS 84 / UTM zone `zone` in the northern (326zz) or southern (327zz)
    /// hemisphere
    pub fn utm(zone: u8, north: bool) -> Self {
        let base = if north { 32600 } else { 32700 };
        Crs::Projected(base + u16::from(zone))
    }

    pub fn epsg(&self) -> u16 {
        match self {
            Crs::Projected(code) | Crs::Geographic(code) => *code,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, Crs::Projected(_))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
