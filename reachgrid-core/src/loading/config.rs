use std::path::PathBuf;

/// OSM `highway` classes treated as drivable when no explicit list is given
pub const DEFAULT_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "unclassified",
    "residential",
    "living_street",
    "service",
    "road",
];

/// OSM `amenity` values treated as facilities by default
pub const DEFAULT_AMENITIES: &[&str] = &["hospital", "clinic"];

/// Inputs of the GeoJSON road network and facility provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// GeoJSON with `LineString`/`MultiLineString` road features
    pub roads_path: PathBuf,
    /// GeoJSON with `Point`/`MultiPoint` facility features
    pub facilities_path: PathBuf,
    /// Accepted `amenity` values; empty accepts every facility
    pub amenities: Vec<String>,
    /// Accepted `highway` values; empty accepts every road
    pub highways: Vec<String>,
}

impl ProviderConfig {
    pub fn new(roads_path: impl Into<PathBuf>, facilities_path: impl Into<PathBuf>) -> Self {
        Self {
            roads_path: roads_path.into(),
            facilities_path: facilities_path.into(),
            amenities: DEFAULT_AMENITIES.iter().map(ToString::to_string).collect(),
            highways: DEFAULT_HIGHWAYS.iter().map(ToString::to_string).collect(),
        }
    }
}
