//! Compiler → filter → normalized file, bounded by a timeout.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{HarnessError, Result};
use crate::filter::StreamFilter;
use crate::runner::ProcessRunner;
use crate::tool::ToolCommand;

/// What a finished capture reports back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Compiler exit code. Informational only.
    pub compiler_exit: Option<i32>,

    /// Wall-clock duration of both processes, in milliseconds.
    pub duration_ms: u64,
}

/// Run the compiler on `input`, pipe its stderr through `filter`, and write
/// the normalized stream to `actual`.
///
/// Returns once both processes have exited and `actual` is closed. With a
/// non-zero `timeout_secs`, whichever process is still running when the
/// limit passes is reported in [`HarnessError::Timeout`] and both are killed.
pub async fn capture(
    compiler: &ToolCommand,
    filter: &ToolCommand,
    input: &Path,
    actual: &Path,
    timeout_secs: u64,
) -> Result<CaptureSummary> {
    let start = Instant::now();

    let mut compiler_proc = ProcessRunner::spawn(compiler, input)?;
    let stderr = compiler_proc.take_stderr()?;
    let mut filter_proc = StreamFilter::spawn(filter, stderr, actual)?;

    let waited = async {
        let compiler_exit = compiler_proc.wait().await?;
        filter_proc.wait().await?;
        Ok::<_, HarnessError>(compiler_exit)
    };

    let compiler_exit = if timeout_secs > 0 {
        let limited = tokio::time::timeout(Duration::from_secs(timeout_secs), waited).await;
        match limited {
            Ok(result) => result?,
            Err(_) => {
                let tool = if compiler_proc.is_running() {
                    compiler.name.clone()
                } else {
                    filter.name.clone()
                };
                compiler_proc.kill().await;
                filter_proc.kill().await;
                return Err(HarnessError::Timeout {
                    tool,
                    limit_secs: timeout_secs,
                });
            }
        }
    } else {
        waited.await?
    };

    Ok(CaptureSummary {
        compiler_exit,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
