use geo::{BoundingRect, Distance, Haversine, Intersects, Point};
use hashbrown::HashMap;
use log::{debug, info};
use rstar::{AABB, RTree, primitives::GeomWithData, primitives::Rectangle};

use super::config::ProviderConfig;
use super::layers::{
    FacilityFeature, RoadFeature, TravelDirection, load_facilities, load_roads, parse_facilities,
    parse_roads,
};
use super::projection::UtmProjection;
use super::{NetworkProvider, TileData};
use crate::tiling::BBox;
use crate::{Error, Facility, NodeId, RoadGraph, RoadNode};

type IndexedRoad = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Provider backed by road and facility GeoJSON layers held in memory.
///
/// Per tile it selects the drivable roads intersecting the tile, splits
/// them into edges at every vertex, weights edges by their haversine length
/// and projects the result into the UTM zone of the tile centre.
#[derive(Debug)]
pub struct GeoJsonProvider {
    roads: Vec<RoadFeature>,
    road_index: RTree<IndexedRoad>,
    facilities: Vec<FacilityFeature>,
    amenities: Vec<String>,
}

impl GeoJsonProvider {
    /// Loads both layers from disk
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or is not valid GeoJSON
    pub fn load(config: &ProviderConfig) -> Result<Self, Error> {
        info!("Loading road network: {}", config.roads_path.display());
        let roads = load_roads(&config.roads_path)?;
        info!("Loading facilities: {}", config.facilities_path.display());
        let facilities = load_facilities(&config.facilities_path)?;

        let provider = Self::from_layers(roads, facilities, config);

        // Parsing large GeoJSON documents allocates heavily and the memory is
        // not always handed back to the system. Release free memory from the
        // tail of the heap before tiles start allocating.
        //
        // # Safety
        //
        // This call is safe to use on linux with glibc implementation
        // which is checked by the cfg attribute in compile time.
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        unsafe {
            if libc::malloc_trim(0) == 0 {
                log::warn!("Memory trimming failed - continuing anyway");
            } else {
                log::debug!("Successfully trimmed unused heap memory");
            }
        }

        Ok(provider)
    }

    /// Builds a provider from in-memory GeoJSON documents
    pub fn from_geojson_str(
        roads: &str,
        facilities: &str,
        config: &ProviderConfig,
    ) -> Result<Self, Error> {
        Ok(Self::from_layers(
            parse_roads(roads)?,
            parse_facilities(facilities)?,
            config,
        ))
    }

    fn from_layers(
        roads: Vec<RoadFeature>,
        facilities: Vec<FacilityFeature>,
        config: &ProviderConfig,
    ) -> Self {
        let roads: Vec<RoadFeature> = roads
            .into_iter()
            .filter(|road| road.is_drivable(&config.highways))
            .collect();

        let road_index = RTree::bulk_load(
            roads
                .iter()
                .enumerate()
                .filter_map(|(idx, road)| {
                    let rect = road.line.bounding_rect()?;
                    Some(GeomWithData::new(
                        Rectangle::from_corners(
                            [rect.min().x, rect.min().y],
                            [rect.max().x, rect.max().y],
                        ),
                        idx,
                    ))
                })
                .collect(),
        );

        info!(
            "Provider ready with {} drivable road lines and {} facilities",
            roads.len(),
            facilities.len()
        );

        Self {
            roads,
            road_index,
            facilities,
            amenities: config.amenities.clone(),
        }
    }

    fn facilities_in(&self, bbox: &BBox) -> impl Iterator<Item = &FacilityFeature> {
        self.facilities.iter().filter(move |facility| {
            bbox.contains(facility.point.x(), facility.point.y())
                && (self.amenities.is_empty()
                    || facility
                        .amenity
                        .as_ref()
                        .is_some_and(|a| self.amenities.contains(a)))
        })
    }

    fn roads_in(&self, bbox: &BBox) -> Vec<&RoadFeature> {
        let rect = bbox.to_rect();
        let envelope = AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]);

        let mut indices: Vec<usize> = self
            .road_index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .filter(|&idx| self.roads[idx].line.intersects(&rect))
            .collect();
        // Stable node numbering regardless of tree traversal order
        indices.sort_unstable();

        indices.into_iter().map(|idx| &self.roads[idx]).collect()
    }
}

impl NetworkProvider for GeoJsonProvider {
    fn fetch(&self, bbox: &BBox) -> Result<TileData, Error> {
        let (centre_lon, centre_lat) = bbox.centre();
        let projection = UtmProjection::for_lon_lat(centre_lon, centre_lat);

        let facilities: Vec<Facility> = self
            .facilities_in(bbox)
            .map(|feature| {
                let (x, y) = projection.project(feature.point.x(), feature.point.y());
                Facility {
                    geometry: Point::new(x, y),
                    name: feature.name.clone(),
                    amenity: feature.amenity.clone(),
                }
            })
            .collect();

        let roads = self.roads_in(bbox);
        let graph = build_graph(&roads, &projection)?;

        debug!(
            "Tile {}: {} road lines, {} nodes, {} edges, {} facilities",
            bbox.tile_name(),
            roads.len(),
            graph.node_count(),
            graph.edge_count(),
            facilities.len()
        );

        Ok(TileData { graph, facilities })
    }
}

/// Splits road lines into edges between consecutive vertices. Vertices with
/// identical coordinates are merged into one node.
fn build_graph(roads: &[&RoadFeature], projection: &UtmProjection) -> Result<RoadGraph, Error> {
    let vertex_count: usize = roads.iter().map(|road| road.line.0.len()).sum();
    let mut graph = RoadGraph::with_capacity(projection.crs(), vertex_count, vertex_count * 2);
    let mut node_ids: HashMap<(u64, u64), NodeId> = HashMap::with_capacity(vertex_count);

    let mut node_for = |graph: &mut RoadGraph, point: Point<f64>| -> NodeId {
        let key = ((point.x() + 0.0).to_bits(), (point.y() + 0.0).to_bits());
        *node_ids.entry(key).or_insert_with(|| {
            let (x, y) = projection.project(point.x(), point.y());
            // GeoJSON vertices carry no ids of their own
            let id = i64::try_from(graph.node_count()).unwrap_or(i64::MAX);
            graph.add_node(RoadNode::new(id, x, y))
        })
    };

    for road in roads {
        for segment in road.line.lines() {
            let start = Point::from(segment.start);
            let end = Point::from(segment.end);
            if start == end {
                continue;
            }

            let length = Haversine.distance(start, end);
            let from = node_for(&mut graph, start);
            let to = node_for(&mut graph, end);

            match road.direction {
                TravelDirection::Both => graph.add_road(from, to, length)?,
                TravelDirection::Forward => {
                    graph.add_edge(from, to, length)?;
                }
                TravelDirection::Backward => {
                    graph.add_edge(to, from, length)?;
                }
            }
        }
    }

    Ok(graph)
}
