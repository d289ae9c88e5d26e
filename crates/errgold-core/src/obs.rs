//! Structured lifecycle events for harness runs.
//!
//! Every run is wrapped in an `errgold.run` span; the `emit_*` helpers log
//! its milestones with a stable `event` field.

use std::path::Path;

use tracing::{info, warn};

/// Span tagged with the run_id. Harness futures are instrumented with it,
/// so every event below inherits the id even when `run_id` is not repeated.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("errgold.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, input: &Path) {
    info!(event = "run.started", run_id = %run_id, input = %input.display());
}

pub fn emit_capture_finished(run_id: &str, compiler_exit: Option<i32>, duration_ms: u64) {
    info!(
        event = "capture.finished",
        run_id = %run_id,
        compiler_exit = ?compiler_exit,
        duration_ms = duration_ms,
    );
}

pub fn emit_compare_finished(run_id: &str, equal: bool, golden_missing: bool) {
    info!(
        event = "compare.finished",
        run_id = %run_id,
        equal = equal,
        golden_missing = golden_missing,
    );
}

pub fn emit_baseline_promoted(run_id: &str, golden: &Path) {
    info!(event = "baseline.promoted", run_id = %run_id, golden = %golden.display());
}

/// Emit event: run reached its terminal state.
pub fn emit_run_finished(run_id: &str, passed: bool, promoted: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        passed = passed,
        promoted = promoted,
    );
}

/// Emit event: run aborted before a verdict (warning level).
pub fn emit_run_aborted(run_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "run.aborted", run_id = %run_id, error = %error);
}
