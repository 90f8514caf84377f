use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::geom::{TileCoord, tile_list_range};
use crate::index::Dataset;
use crate::pipeline::context::{RunContext, RunSummary, TileOutcome};
use crate::pipeline::{progress, render};
use crate::raster::RasterCache;
use crate::tiles::TileSink;
use crate::tileset::Settings;

/// Renders a whole pyramid, zoom by zoom from finest to coarsest.
///
/// Tiles of one zoom render in parallel on a rayon pool; their outcomes flow
/// back over a channel to the calling thread, which alone talks to the sink.
/// A zoom starts only after every tile of the zoom above has finished, so all
/// cached rasters it reads are complete.
pub struct Pipeline<'a> {
    dataset: &'a Dataset,
    cache: RasterCache,
    settings: Settings,
    progress: bool,
}

impl<'a> Pipeline<'a> {
    /// Rasters are cached under `{work_dir}/rasters`.
    pub fn new(dataset: &'a Dataset, settings: Settings, work_dir: &Path) -> Result<Self> {
        settings.validate().context("[pipeline] invalid settings")?;
        let cache = RasterCache::new(&work_dir.join("rasters"))?;
        Ok(Self { dataset, cache, settings, progress: false })
    }

    /// Draw a progress bar per zoom on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn cache(&self) -> &RasterCache { &self.cache }

    /// Render one tile, turning errors and panics into [`TileOutcome::Failed`].
    pub fn render(&self, coord: TileCoord) -> TileOutcome {
        contain(coord, || render::render_tile(coord, self.dataset, &self.cache, &self.settings))
    }

    /// Render every zoom into `sink` using `threads` workers (0 picks one per core).
    ///
    /// Failed tiles are logged and counted; sink errors abort the run.
    pub fn run(&self, sink: &mut dyn TileSink, threads: usize) -> Result<RunSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("[pipeline] Failed to build worker pool")?;

        let zooms = tile_list_range(self.dataset.bound(), self.settings.min_zoom, self.settings.max_zoom);
        let total = zooms.iter().map(|(_, tiles)| tiles.len()).sum();
        let context = RunContext::new(total);
        info!("[pipeline] rendering {total} tiles on {} threads", pool.current_num_threads());

        let mut per_zoom = Vec::with_capacity(zooms.len());
        for (zoom, tiles) in &zooms {
            let written = self.run_zoom(*zoom, tiles, &pool, &context, sink)?;
            debug!("[pipeline] z{zoom}: {written} of {} tiles written", tiles.len());
            per_zoom.push((*zoom, written));
        }

        sink.finish().context("[pipeline] Failed to finalize tile container")?;
        let summary = context.summary(per_zoom);
        info!(
            "[pipeline] {} tiles written, {} empty, {} failed in {:.1}s",
            summary.tiles_written,
            summary.tiles_empty,
            summary.tiles_failed,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    fn run_zoom(
        &self,
        zoom: u8,
        tiles: &[TileCoord],
        pool: &rayon::ThreadPool,
        context: &RunContext,
        sink: &mut dyn TileSink,
    ) -> Result<usize> {
        let bar = progress::zoom_bar(zoom, tiles.len(), self.progress);
        let (tx, rx) = mpsc::channel::<TileOutcome>();
        let mut written = 0;

        // Leaving the scope joins the workers: the barrier between zooms.
        std::thread::scope(|scope| -> Result<()> {
            scope.spawn(move || {
                pool.install(|| {
                    tiles.par_iter().for_each_with(tx, |tx, &coord| {
                        let outcome = self.render(coord);
                        context.record(&outcome);
                        // The receiver only goes away when the run is already aborting.
                        let _ = tx.send(outcome);
                    });
                });
            });

            for outcome in rx {
                match outcome {
                    TileOutcome::Written { coord, bytes } => {
                        sink.put_tile(coord, &bytes)
                            .with_context(|| format!("[pipeline] Failed to write tile {coord}"))?;
                        written += 1;
                    }
                    TileOutcome::Empty { .. } => {}
                    TileOutcome::Failed { coord, error } => {
                        warn!("[pipeline] tile {coord} failed: {error}");
                    }
                }
                bar.inc(1);
                bar.set_message(format!("{}s", context.eta_secs()));
            }
            Ok(())
        })?;

        bar.finish_and_clear();
        Ok(written)
    }
}

/// Run one tile's work, keeping a panic inside it from unwinding into the pool.
fn contain(coord: TileCoord, work: impl FnOnce() -> Result<Option<Vec<u8>>>) -> TileOutcome {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(Some(bytes))) => TileOutcome::Written { coord, bytes },
        Ok(Ok(None)) => TileOutcome::Empty { coord },
        Ok(Err(err)) => TileOutcome::Failed { coord, error: format!("{err:#}") },
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            TileOutcome::Failed { coord, error: format!("panicked: {message}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::contain;
    use crate::geom::TileCoord;
    use crate::pipeline::context::TileOutcome;

    #[test]
    fn panics_become_failures() {
        let coord = TileCoord::new(5, 3, 4);
        match contain(coord, || panic!("boom")) {
            TileOutcome::Failed { coord: failed, error } => {
                assert_eq!(failed, coord);
                assert_eq!(error, "panicked: boom");
            }
            other => panic!("expected a failure, got {other:?}"),
        }

        let index = 7;
        match contain(coord, || panic!("bad ring {index}")) {
            TileOutcome::Failed { error, .. } => assert_eq!(error, "panicked: bad ring 7"),
            other => panic!("expected a failure, got {other:?}"),
        }

        match contain(coord, || std::panic::panic_any(42u32)) {
            TileOutcome::Failed { error, .. } => assert_eq!(error, "panicked: unknown panic"),
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[test]
    fn errors_and_empty_tiles_pass_through() {
        let coord = TileCoord::new(2, 1, 1);
        match contain(coord, || Err(anyhow::anyhow!("[test] cache gone"))) {
            TileOutcome::Failed { error, .. } => assert_eq!(error, "[test] cache gone"),
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(matches!(contain(coord, || Ok(None)), TileOutcome::Empty { .. }));
        match contain(coord, || Ok(Some(vec![1, 2, 3]))) {
            TileOutcome::Written { bytes, .. } => assert_eq!(bytes, vec![1, 2, 3]),
            other => panic!("expected a written tile, got {other:?}"),
        }
    }
}
