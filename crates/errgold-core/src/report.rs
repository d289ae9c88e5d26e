//! Machine-readable summary of one harness run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};
use crate::harness::{HarnessConfig, RunOutcome, TerminalState};

/// JSON run report, written when the caller asks for one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub finished_at: DateTime<Utc>,
    pub input: PathBuf,
    pub golden_path: PathBuf,
    pub actual_path: PathBuf,
    pub state: TerminalState,
    pub promoted: bool,
    pub exit_code: u8,

    /// Informational; never part of the verdict.
    pub compiler_exit: Option<i32>,
    pub duration_ms: u64,
    pub actual_digest: String,

    /// Digest of the golden file as compared, i.e. before any promotion.
    pub golden_digest: Option<String>,
}

impl RunReport {
    pub fn new(outcome: &RunOutcome, input: &Path, config: &HarnessConfig) -> Self {
        Self {
            run_id: outcome.run_id.clone(),
            finished_at: Utc::now(),
            input: input.to_path_buf(),
            golden_path: config.golden_path.clone(),
            actual_path: config.actual_path.clone(),
            state: outcome.state,
            promoted: outcome.promoted,
            exit_code: outcome.exit_code(),
            compiler_exit: outcome.capture.compiler_exit,
            duration_ms: outcome.capture.duration_ms,
            actual_digest: outcome.actual_digest.clone(),
            golden_digest: outcome.golden_digest.clone(),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| HarnessError::io(path, e.into()))?;
        std::fs::write(path, json).map_err(|e| HarnessError::io(path, e))
    }
}
