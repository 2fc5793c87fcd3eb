use std::cell::Cell;
use std::fs;
use std::path::Path;

use reachgrid_core::loading::{NetworkProvider, TileData};
use reachgrid_core::pipeline::{
    BatchSummary, TileConfig, TileStatus, process_tile, run_batch, run_batch_with,
};
use reachgrid_core::tiling::{BBox, generate_tiles};
use reachgrid_core::{Crs, Error, Facility, RoadGraph, RoadNode};
use tiff::decoder::{Decoder, DecodingResult};

const SPACING: f64 = 100.0;

/// Serves the same square street lattice for every tile
struct LatticeProvider {
    size: usize,
    facilities: Vec<(f64, f64)>,
    edge_length: f64,
}

impl LatticeProvider {
    fn new(size: usize) -> Self {
        Self {
            size,
            facilities: vec![(0.0, 0.0)],
            edge_length: SPACING,
        }
    }

    fn graph(&self) -> Result<RoadGraph, Error> {
        let mut graph = RoadGraph::new(Crs::utm(31, true));
        let mut ids = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                let id = graph.add_node(RoadNode::new(
                    (row * self.size + col) as i64,
                    col as f64 * SPACING,
                    row as f64 * SPACING,
                ));
                ids.push(id);
            }
        }
        for row in 0..self.size {
            for col in 0..self.size {
                let here = ids[row * self.size + col];
                if col + 1 < self.size {
                    graph.add_road(here, ids[row * self.size + col + 1], self.edge_length)?;
                }
                if row + 1 < self.size {
                    graph.add_road(here, ids[(row + 1) * self.size + col], self.edge_length)?;
                }
            }
        }
        Ok(graph)
    }
}

impl NetworkProvider for LatticeProvider {
    fn fetch(&self, bbox: &BBox) -> Result<TileData, Error> {
        if bbox.min_lon < 0.0 {
            return Err(Error::ProviderFailure("upstream timeout".into()));
        }
        Ok(TileData {
            graph: self.graph()?,
            facilities: self
                .facilities
                .iter()
                .map(|&(x, y)| Facility::new(x, y))
                .collect(),
        })
    }
}

/// Serves nodes along a single straight road
struct StraightRoadProvider;

impl NetworkProvider for StraightRoadProvider {
    fn fetch(&self, _bbox: &BBox) -> Result<TileData, Error> {
        let mut graph = RoadGraph::new(Crs::utm(31, true));
        let mut previous = None;
        for i in 0..20 {
            let x = f64::from(i) * SPACING;
            let node = graph.add_node(RoadNode::new(i64::from(i), x, x));
            if let Some(previous) = previous {
                graph.add_road(previous, node, SPACING * 2f64.sqrt())?;
            }
            previous = Some(node);
        }
        Ok(TileData {
            graph,
            facilities: vec![Facility::new(0.0, 0.0)],
        })
    }
}

fn config(dir: &Path) -> TileConfig {
    TileConfig {
        output_dir: dir.to_path_buf(),
        resolution: 16,
        workers: 2,
        ..TileConfig::default()
    }
}

fn tile() -> BBox {
    BBox::new(2.0, 48.0, 3.0, 49.0)
}

#[test]
fn test_written_tile_is_resumable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let provider = LatticeProvider::new(6);

    let first = process_tile(&tile(), &provider, &config);
    let path = tile().tile_path(dir.path());
    let bytes = fs::read(&path).unwrap();
    let second = process_tile(&tile(), &provider, &config);

    assert_eq!(first, TileStatus::Written);
    assert_eq!(second, TileStatus::SkippedExists);
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[test]
fn test_written_tile_contents() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let status = process_tile(&tile(), &LatticeProvider::new(6), &config);
    assert_eq!(status, TileStatus::Written);

    let file = fs::File::open(tile().tile_path(dir.path())).unwrap();
    let mut decoder = Decoder::new(file).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (16, 16));
    let DecodingResult::F32(values) = decoder.read_image().unwrap() else {
        panic!("expected a Float32 band");
    };

    // The facility sits in the south-west corner, the last row's first cell
    let near = values[15 * 16];
    let far = values[15];
    assert!(near < far, "{near} should be below {far}");
    assert!(values.iter().all(|v| v.is_nan() || *v >= 0.0));
}

#[test]
fn test_tile_without_facilities_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LatticeProvider {
        facilities: Vec::new(),
        ..LatticeProvider::new(6)
    };

    let status = process_tile(&tile(), &provider, &config(dir.path()));

    assert_eq!(status, TileStatus::SkippedNoFacilities);
    assert!(!tile().tile_path(dir.path()).exists());
}

#[test]
fn test_sparse_network_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();

    // 3 x 3 lattice gives 9 samples, one below the default threshold
    let status = process_tile(&tile(), &LatticeProvider::new(3), &config(dir.path()));

    assert_eq!(status, TileStatus::SkippedInsufficientData);
    assert!(!tile().tile_path(dir.path()).exists());
}

#[test]
fn test_collinear_network_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();

    let status = process_tile(&tile(), &StraightRoadProvider, &config(dir.path()));

    assert_eq!(status, TileStatus::SkippedInsufficientData);
}

#[test]
fn test_cutoff_limits_samples() {
    let dir = tempfile::tempdir().unwrap();
    let config = TileConfig {
        cutoff: 150.0,
        ..config(dir.path())
    };

    // Only the three nodes within one hop of the corner are reachable
    let status = process_tile(&tile(), &LatticeProvider::new(6), &config);

    assert_eq!(status, TileStatus::SkippedInsufficientData);
}

#[test]
fn test_provider_failure_fails_tile() {
    let dir = tempfile::tempdir().unwrap();

    let status = process_tile(
        &BBox::new(-1.0, 48.0, 0.0, 49.0),
        &LatticeProvider::new(6),
        &config(dir.path()),
    );

    let TileStatus::Failed(reason) = status else {
        panic!("expected a failed tile, got {status:?}");
    };
    assert!(reason.contains("upstream timeout"));
}

#[test]
fn test_negative_weight_fails_tile() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LatticeProvider {
        edge_length: -1.0,
        ..LatticeProvider::new(6)
    };

    let status = process_tile(&tile(), &provider, &config(dir.path()));

    assert!(status.is_failed());
    assert!(!tile().tile_path(dir.path()).exists());
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let tiles: Vec<BBox> = generate_tiles(BBox::new(-2.0, 48.0, 2.0, 49.0), 1.0).collect();

    let outcomes = run_batch(tiles.clone(), &LatticeProvider::new(6), &config).unwrap();
    let summary: BatchSummary = outcomes.iter().collect();

    let offered: Vec<BBox> = outcomes.iter().map(|o| o.tile).collect();
    assert_eq!(offered, tiles);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.written, 2);

    // A second run only finds existing tiles and the same failures
    let rerun = run_batch(tiles, &LatticeProvider::new(6), &config).unwrap();
    let summary: BatchSummary = rerun.iter().collect();
    assert_eq!(summary.skipped_exists, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.total(), 4);
}

#[test]
fn test_batch_streams_tiles_in_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    // Western tiles fail fast in the provider
    let region = BBox::new(-100.0, 0.0, 0.0, 1.0);
    let pulled = Cell::new(0usize);
    let pulled_at_first_outcome = Cell::new(None);
    let mut seen = Vec::new();

    let tiles = generate_tiles(region, 1.0).inspect(|_| pulled.set(pulled.get() + 1));
    let summary = run_batch_with(tiles, &LatticeProvider::new(6), &config, |outcome| {
        if pulled_at_first_outcome.get().is_none() {
            pulled_at_first_outcome.set(Some(pulled.get()));
        }
        seen.push(outcome);
    })
    .unwrap();

    assert_eq!(summary.failed, 100);
    assert_eq!(summary, seen.iter().collect::<BatchSummary>());
    let offered: Vec<BBox> = seen.iter().map(|o| o.tile).collect();
    assert_eq!(offered, generate_tiles(region, 1.0).collect::<Vec<_>>());
    // Two workers take 32 tiles per chunk
    assert_eq!(pulled_at_first_outcome.get(), Some(32));
}
