//! Progress reporting hooks.

use tracing::{debug, info};

use crate::types::RunStats;

/// Receives progress events from a running analysis.
///
/// Calls arrive from worker threads (`start_file`, `complete_file`) and from
/// the aggregating thread (`update_progress`, `complete`), so implementations
/// must be thread-safe. Every `start_file` is followed by a `complete_file`
/// for the same path, and `complete` is called exactly once per run.
pub trait ProgressReporter: Send + Sync {
    /// A worker started on `path`.
    fn start_file(&self, _path: &str) {}

    /// A worker finished `path` with `violations` findings.
    fn complete_file(&self, _path: &str, _violations: usize) {}

    /// `current` of `total` files have been aggregated.
    fn update_progress(&self, _current: usize, _total: usize) {}

    /// The run ended, successfully or not.
    fn complete(&self, _stats: &RunStats) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn start_file(&self, path: &str) {
        debug!("Analyzing: {path}");
    }

    fn complete_file(&self, path: &str, violations: usize) {
        debug!("Finished {path}: {violations} violation(s)");
    }

    fn update_progress(&self, current: usize, total: usize) {
        debug!("Progress: {current}/{total}");
    }

    fn complete(&self, stats: &RunStats) {
        info!(
            "Analyzed {} files ({} cached, {} skipped) in {:?}",
            stats.files_processed(),
            stats.files_cached,
            stats.files_skipped,
            stats.elapsed
        );
    }
}
