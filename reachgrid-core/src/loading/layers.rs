//! Reading road and facility layers from GeoJSON

use std::fs;
use std::path::Path;

use geo::{Geometry, LineString, Point};
use geojson::{Feature, GeoJson};
use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::Error;

/// Direction in which a road segment may be driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TravelDirection {
    Both,
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub(super) struct RoadFeature {
    pub line: LineString<f64>,
    pub highway: Vec<String>,
    pub direction: TravelDirection,
}

impl RoadFeature {
    /// A road matches when it carries no `highway` tag or one of its tags is
    /// accepted. An empty filter accepts everything.
    pub fn is_drivable(&self, accepted: &[String]) -> bool {
        accepted.is_empty()
            || self.highway.is_empty()
            || self.highway.iter().any(|h| accepted.contains(h))
    }
}

#[derive(Debug, Clone)]
pub(super) struct FacilityFeature {
    pub point: Point<f64>,
    pub name: Option<String>,
    pub amenity: Option<String>,
}

fn read_features(path: &Path) -> Result<Vec<Feature>, Error> {
    let contents = fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    parse_features(&contents)
        .map_err(|e| Error::GeoJsonError(format!("{}: {e}", path.display())))
}

fn parse_features(contents: &str) -> Result<Vec<Feature>, Error> {
    let geojson: GeoJson = contents
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJsonError(e.to_string()))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(Error::GeoJsonError(
            "expected a Feature or FeatureCollection, got a bare Geometry".to_string(),
        )),
    }
}

fn feature_geometry(feature: &mut Feature) -> Option<Geometry<f64>> {
    let geometry = feature.geometry.take()?;
    match Geometry::<f64>::try_from(geometry) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            debug!("Skipping feature with unreadable geometry: {e}");
            None
        }
    }
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `highway` may be a single tag or a list of tags on merged ways
fn highway_tags(feature: &Feature) -> Vec<String> {
    match feature.property("highway") {
        Some(JsonValue::String(s)) => vec![s.clone()],
        Some(JsonValue::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn travel_direction(feature: &Feature) -> TravelDirection {
    match string_property(feature, "oneway").as_deref() {
        Some("yes" | "true" | "1") => TravelDirection::Forward,
        Some("-1" | "reverse") => TravelDirection::Backward,
        _ => TravelDirection::Both,
    }
}

pub(super) fn parse_roads(contents: &str) -> Result<Vec<RoadFeature>, Error> {
    Ok(roads_from_features(parse_features(contents)?))
}

pub(super) fn load_roads(path: &Path) -> Result<Vec<RoadFeature>, Error> {
    Ok(roads_from_features(read_features(path)?))
}

fn roads_from_features(features: Vec<Feature>) -> Vec<RoadFeature> {
    let mut roads = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for mut feature in features {
        let highway = highway_tags(&feature);
        let direction = travel_direction(&feature);

        let lines = match feature_geometry(&mut feature) {
            Some(Geometry::LineString(line)) => vec![line],
            Some(Geometry::MultiLineString(lines)) => lines.0,
            _ => {
                skipped += 1;
                continue;
            }
        };

        roads.extend(
            lines
                .into_iter()
                .filter(|line| line.0.len() >= 2)
                .map(|line| RoadFeature {
                    line,
                    highway: highway.clone(),
                    direction,
                }),
        );
    }

    if skipped > 0 {
        warn!("Skipped {skipped} road features without line geometry");
    }
    roads
}

pub(super) fn parse_facilities(contents: &str) -> Result<Vec<FacilityFeature>, Error> {
    Ok(facilities_from_features(parse_features(contents)?))
}

pub(super) fn load_facilities(path: &Path) -> Result<Vec<FacilityFeature>, Error> {
    Ok(facilities_from_features(read_features(path)?))
}

fn facilities_from_features(features: Vec<Feature>) -> Vec<FacilityFeature> {
    let mut facilities = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for mut feature in features {
        let name = string_property(&feature, "name");
        let amenity = string_property(&feature, "amenity");

        let points = match feature_geometry(&mut feature) {
            Some(Geometry::Point(point)) => vec![point],
            Some(Geometry::MultiPoint(points)) => points.0,
            _ => {
                skipped += 1;
                continue;
            }
        };

        facilities.extend(points.into_iter().map(|point| FacilityFeature {
            point,
            name: name.clone(),
            amenity: amenity.clone(),
        }));
    }

    if skipped > 0 {
        warn!("Skipped {skipped} facility features without point geometry");
    }
    facilities
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROADS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"highway": "primary", "oneway": "yes"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0]]}},
            {"type": "Feature", "properties": {"highway": ["residential", "service"], "oneway": "-1"},
             "geometry": {"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [0.0, 0.01]], [[0.0, 0.01], [0.01, 0.01]]]}},
            {"type": "Feature", "properties": {"highway": "footway"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.005, 0.005]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}
        ]
    }"#;

    #[test]
    fn test_parse_roads() {
        let roads = parse_roads(ROADS).unwrap();

        assert_eq!(roads.len(), 4);
        assert_eq!(roads[0].direction, TravelDirection::Forward);
        assert_eq!(roads[1].direction, TravelDirection::Backward);
        assert_eq!(roads[1].highway, vec!["residential", "service"]);
        assert_eq!(roads[3].direction, TravelDirection::Both);
    }

    #[test]
    fn test_drivable_filter() {
        let roads = parse_roads(ROADS).unwrap();
        let accepted = vec!["primary".to_string(), "service".to_string()];

        let drivable: Vec<_> = roads.iter().map(|r| r.is_drivable(&accepted)).collect();

        assert_eq!(drivable, vec![true, true, true, false]);
        assert!(roads[3].is_drivable(&[]));
    }

    #[test]
    fn test_parse_facilities() {
        let facilities = parse_facilities(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"name": "City Hospital", "amenity": "hospital"},
                 "geometry": {"type": "Point", "coordinates": [85.324, 27.7172]}},
                {"type": "Feature", "properties": {"amenity": "clinic"},
                 "geometry": {"type": "MultiPoint", "coordinates": [[85.31, 27.705], [85.34, 27.7155]]}},
                {"type": "Feature", "properties": {"amenity": "hospital"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(facilities.len(), 3);
        assert_eq!(facilities[0].name.as_deref(), Some("City Hospital"));
        assert_eq!(facilities[2].amenity.as_deref(), Some("clinic"));
        assert_eq!(facilities[2].point, Point::new(85.34, 27.7155));
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let result = parse_roads(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#);

        assert!(matches!(result, Err(Error::GeoJsonError(_))));
    }
}
