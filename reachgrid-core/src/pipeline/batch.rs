use std::fmt;
use std::time::Instant;

use log::info;
use rayon::prelude::*;

use super::{TileConfig, TileOutcome, TileStatus, process_tile};
use crate::Error;
use crate::loading::NetworkProvider;
use crate::tiling::BBox;

/// Tiles handed to the pool at once, per worker thread
const TILES_PER_WORKER: usize = 16;

/// Processes `tiles` on a dedicated pool of `config.workers` threads and
/// collects every outcome, in the order the tiles were offered.
///
/// # Errors
///
/// Returns `InvalidData` if the worker pool cannot be created. Per-tile
/// errors never abort the batch.
pub fn run_batch<P, I>(
    tiles: I,
    provider: &P,
    config: &TileConfig,
) -> Result<Vec<TileOutcome>, Error>
where
    P: NetworkProvider + Sync + ?Sized,
    I: IntoIterator<Item = BBox>,
{
    let mut outcomes = Vec::new();
    run_batch_with(tiles, provider, config, |outcome| outcomes.push(outcome))?;
    Ok(outcomes)
}

/// Streams `tiles` through the worker pool in bounded chunks.
///
/// Tiles are pulled lazily from the iterator, at most a few per worker at a
/// time, and every outcome is passed to `on_outcome` in offer order before
/// it is dropped. Only the summary is kept.
///
/// # Errors
///
/// Returns `InvalidData` if the worker pool cannot be created
pub fn run_batch_with<P, I, F>(
    tiles: I,
    provider: &P,
    config: &TileConfig,
    mut on_outcome: F,
) -> Result<BatchSummary, Error>
where
    P: NetworkProvider + Sync + ?Sized,
    I: IntoIterator<Item = BBox>,
    F: FnMut(TileOutcome),
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("reachgrid-tile-{i}"))
        .build()
        .map_err(|e| Error::InvalidData(format!("Failed to build worker pool: {e}")))?;

    let chunk_len = pool.current_num_threads().max(1) * TILES_PER_WORKER;
    info!("Processing tiles on {} workers", pool.current_num_threads());
    let start = Instant::now();

    let mut summary = BatchSummary::default();
    let mut tiles = tiles.into_iter();
    let mut chunk: Vec<BBox> = Vec::with_capacity(chunk_len);
    loop {
        chunk.clear();
        chunk.extend(tiles.by_ref().take(chunk_len));
        if chunk.is_empty() {
            break;
        }

        let outcomes: Vec<TileOutcome> = pool.install(|| {
            chunk
                .par_iter()
                .map(|tile| TileOutcome {
                    tile: *tile,
                    status: process_tile(tile, provider, config),
                })
                .collect()
        });

        for outcome in outcomes {
            summary.record(&outcome.status);
            on_outcome(outcome);
        }
    }

    info!("Batch finished in {:.1?}", start.elapsed());
    Ok(summary)
}

/// Counts of tile outcomes per terminal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped_exists: usize,
    pub skipped_no_facilities: usize,
    pub skipped_insufficient_data: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.written
            + self.skipped_exists
            + self.skipped_no_facilities
            + self.skipped_insufficient_data
            + self.failed
    }

    fn record(&mut self, status: &TileStatus) {
        match status {
            TileStatus::Written => self.written += 1,
            TileStatus::SkippedExists => self.skipped_exists += 1,
            TileStatus::SkippedNoFacilities => self.skipped_no_facilities += 1,
            TileStatus::SkippedInsufficientData => self.skipped_insufficient_data += 1,
            TileStatus::Failed(_) => self.failed += 1,
        }
    }
}

impl<'a> FromIterator<&'a TileOutcome> for BatchSummary {
    fn from_iter<T: IntoIterator<Item = &'a TileOutcome>>(iter: T) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in iter {
            summary.record(&outcome.status);
        }
        summary
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles: {} written, {} already present, {} without facilities, \
             {} with insufficient data, {} failed",
            self.total(),
            self.written,
            self.skipped_exists,
            self.skipped_no_facilities,
            self.skipped_insufficient_data,
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let tile = BBox::new(0.0, 0.0, 1.0, 1.0);
        let outcomes: Vec<_> = [
            TileStatus::Written,
            TileStatus::Written,
            TileStatus::SkippedExists,
            TileStatus::SkippedNoFacilities,
            TileStatus::Failed("boom".into()),
        ]
        .into_iter()
        .map(|status| TileOutcome { tile, status })
        .collect();

        let summary: BatchSummary = outcomes.iter().collect();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.skipped_exists, 1);
        assert_eq!(summary.skipped_no_facilities, 1);
        assert_eq!(summary.skipped_insufficient_data, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 5);
        assert_eq!(
            summary.to_string(),
            "5 tiles: 2 written, 1 already present, 1 without facilities, \
             0 with insufficient data, 1 failed"
        );
    }
}
