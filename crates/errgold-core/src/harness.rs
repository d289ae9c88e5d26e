//! Run orchestration: capture, compare, decide, optionally promote.
//!
//! A run ends in exactly one of two terminal states. Promotion is a flag on
//! the `Failed` state, not a state of its own: a run that rewrote the golden
//! file still exits non-zero, and only the *next* run can pass against the
//! new baseline.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Instrument;
use uuid::Uuid;

use crate::baseline;
use crate::capture::{capture, CaptureSummary};
use crate::compare::GoldenComparator;
use crate::error::{HarnessError, Result};
use crate::obs::{
    emit_baseline_promoted, emit_capture_finished, emit_compare_finished, emit_run_aborted,
    emit_run_finished, emit_run_started, run_span,
};
use crate::tool::ToolCommand;

/// Environment variable that requests promotion when set to a non-empty value.
pub const UPDATE_ENV_VAR: &str = "GOLDEN";

/// Default golden reference path.
pub const DEFAULT_GOLDEN_PATH: &str = "golden_stderr";

/// Default normalized output path.
pub const DEFAULT_ACTUAL_PATH: &str = "actual_stderr";

/// Default capture limit in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1200;

/// Written to stdout before the verdict.
pub const SEPARATOR: &str = "\n\n\n";

/// Written to stdout after the separator when the outputs match.
pub const SUCCESS_MARKER: &str = "SUCCESS\n\n\n";

/// Whether `GOLDEN` is set to a non-empty value in this process's environment.
pub fn promotion_requested_by_env() -> bool {
    env_flag_set(std::env::var_os(UPDATE_ENV_VAR))
}

fn env_flag_set(value: Option<OsString>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Compiler under test. The input path is appended to its arguments.
    pub compiler: ToolCommand,

    /// Normalizing filter between compiler stderr and `actual_path`.
    pub filter: ToolCommand,

    /// Golden reference file.
    pub golden_path: PathBuf,

    /// Normalized output file, rewritten on every run.
    pub actual_path: PathBuf,

    /// Capture limit in seconds (0 = unbounded).
    pub timeout_secs: u64,

    /// Overwrite the golden file when the comparison fails.
    pub promote_on_mismatch: bool,

    /// Color the rendered diff.
    pub color: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: ToolCommand::verilator(),
            filter: ToolCommand::strip_verilator_errmsg(),
            golden_path: PathBuf::from(DEFAULT_GOLDEN_PATH),
            actual_path: PathBuf::from(DEFAULT_ACTUAL_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            promote_on_mismatch: false,
            color: false,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Passed,
    Failed,
}

/// Result of a run that reached a verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: String,
    pub state: TerminalState,

    /// The golden file was replaced. Only ever true when `state` is `Failed`.
    pub promoted: bool,

    pub capture: CaptureSummary,
    pub golden_missing: bool,
    pub actual_digest: String,
    pub golden_digest: Option<String>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.state == TerminalState::Passed
    }

    /// Process exit status: 0 when passed, 1 otherwise, promoted or not.
    pub fn exit_code(&self) -> u8 {
        match self.state {
            TerminalState::Passed => 0,
            TerminalState::Failed => 1,
        }
    }
}

/// Golden-file regression harness.
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the compiler on `input` and judge its normalized diagnostics.
    ///
    /// The verdict is written to `out`: the separator, then either the
    /// success marker or the diff. A capture error aborts the run before
    /// anything is written; an aborted run never reports a verdict.
    pub async fn run<W: Write>(&self, input: &Path, out: &mut W) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let result = self
            .run_inner(&run_id, input, out)
            .instrument(run_span(&run_id))
            .await;

        if let Err(e) = &result {
            emit_run_aborted(&run_id, e);
        }
        result
    }

    async fn run_inner<W: Write>(&self, run_id: &str, input: &Path, out: &mut W) -> Result<RunOutcome> {
        let config = &self.config;
        emit_run_started(run_id, input);

        let summary = capture(
            &config.compiler,
            &config.filter,
            input,
            &config.actual_path,
            config.timeout_secs,
        )
        .await?;
        emit_capture_finished(run_id, summary.compiler_exit, summary.duration_ms);

        write_out(out, SEPARATOR)?;

        let comparison = GoldenComparator::new(config.color)
            .compare(&config.golden_path, &config.actual_path)
            .await?;
        emit_compare_finished(run_id, comparison.equal, comparison.golden_missing);

        let mut promoted = false;
        let state = if comparison.equal {
            write_out(out, SUCCESS_MARKER)?;
            TerminalState::Passed
        } else {
            if let Some(diff) = &comparison.diff {
                write_out(out, diff)?;
            }

            if config.promote_on_mismatch {
                baseline::promote(&config.actual_path, &config.golden_path)?;
                emit_baseline_promoted(run_id, &config.golden_path);
                promoted = true;
            } else if comparison.golden_missing {
                tracing::info!("Set {}=1 to record the current output as the baseline", UPDATE_ENV_VAR);
            }
            TerminalState::Failed
        };

        emit_run_finished(run_id, state == TerminalState::Passed, promoted);

        Ok(RunOutcome {
            run_id: run_id.to_string(),
            state,
            promoted,
            capture: summary,
            golden_missing: comparison.golden_missing,
            actual_digest: comparison.actual_digest,
            golden_digest: comparison.golden_digest,
        })
    }
}

fn write_out<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| HarnessError::io("<output>", e))
}
