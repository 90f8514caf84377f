use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::geom::TileCoord;

/// Result of rendering one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    /// Encoded, gzipped tile bytes ready for the sink.
    Written { coord: TileCoord, bytes: Vec<u8> },
    /// Nothing to draw; no tile is written.
    Empty { coord: TileCoord },
    /// Rendering failed; the run continues without this tile.
    Failed { coord: TileCoord, error: String },
}

impl TileOutcome {
    pub fn coord(&self) -> TileCoord {
        match self {
            TileOutcome::Written { coord, .. }
            | TileOutcome::Empty { coord }
            | TileOutcome::Failed { coord, .. } => *coord,
        }
    }
}

/// Counters shared by every worker of one run.
#[derive(Debug)]
pub(crate) struct RunContext {
    started: Instant,
    total: usize,
    completed: AtomicUsize,
    written: AtomicUsize,
    empty: AtomicUsize,
    failed: AtomicUsize,
}

impl RunContext {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            started: Instant::now(),
            total,
            completed: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            empty: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn record(&self, outcome: &TileOutcome) {
        let counter = match outcome {
            TileOutcome::Written { .. } => &self.written,
            TileOutcome::Empty { .. } => &self.empty,
            TileOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn completed(&self) -> usize { self.completed.load(Ordering::Relaxed) }

    pub(crate) fn elapsed(&self) -> Duration { self.started.elapsed() }

    /// Seconds left if the remaining tiles go at the average pace so far.
    pub(crate) fn eta_secs(&self) -> u64 {
        let done = self.completed();
        if done == 0 {
            return 0;
        }
        let per_tile = self.elapsed().as_secs_f64() / done as f64;
        (per_tile * self.total.saturating_sub(done) as f64).round() as u64
    }

    pub(crate) fn summary(&self, per_zoom: Vec<(u8, usize)>) -> RunSummary {
        RunSummary {
            tiles_total: self.total,
            tiles_written: self.written.load(Ordering::Relaxed),
            tiles_empty: self.empty.load(Ordering::Relaxed),
            tiles_failed: self.failed.load(Ordering::Relaxed),
            per_zoom,
            elapsed: self.elapsed(),
        }
    }
}

/// Totals for one finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub tiles_total: usize,
    pub tiles_written: usize,
    pub tiles_empty: usize,
    pub tiles_failed: usize,
    /// Tiles written per zoom, finest zoom first.
    pub per_zoom: Vec<(u8, usize)>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::{RunContext, TileOutcome};
    use crate::geom::TileCoord;

    #[test]
    fn record_counts_each_kind() {
        let context = RunContext::new(4);
        let coord = TileCoord::new(1, 0, 0);
        context.record(&TileOutcome::Written { coord, bytes: vec![1] });
        context.record(&TileOutcome::Empty { coord });
        context.record(&TileOutcome::Failed { coord, error: "boom".into() });

        let summary = context.summary(vec![(1, 1)]);
        assert_eq!(context.completed(), 3);
        assert_eq!((summary.tiles_written, summary.tiles_empty, summary.tiles_failed), (1, 1, 1));
        assert_eq!(summary.tiles_total, 4);
    }
}
