//! Error types for the harness.
//!
//! A comparison mismatch is not an error: it is the `Failed` terminal state of
//! a run. Everything in here aborts a run before a verdict is reached.

use std::path::PathBuf;

/// Errors that abort a harness run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited unsuccessfully (exit code: {})", display_code(.code))]
    ToolFailed { tool: String, code: Option<i32> },

    #[error("{tool} did not finish within {limit_secs}s")]
    Timeout { tool: String, limit_secs: u64 },

    #[error("stderr of {tool} was already taken")]
    StderrTaken { tool: String },

    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "killed by signal".to_string(),
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
