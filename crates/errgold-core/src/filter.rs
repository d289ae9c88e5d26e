//! Normalizing filter process, fed straight from the compiler's stderr pipe.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, Command};

use crate::error::{HarnessError, Result};
use crate::tool::ToolCommand;

/// Launches the filter between the compiler and the normalized output file.
pub struct StreamFilter;

impl StreamFilter {
    /// Spawn the filter with `stream` as its stdin and `output` as its stdout.
    ///
    /// `output` is truncated before the filter starts. The raw stream is an OS
    /// pipe handed over as-is, so the compiler blocks whenever the filter falls
    /// behind.
    pub fn spawn(filter: &ToolCommand, stream: ChildStderr, output: &Path) -> Result<FilterProcess> {
        let stdin: Stdio = stream.try_into().map_err(|source| HarnessError::Launch {
            tool: filter.name.clone(),
            source,
        })?;
        let sink = File::create(output).map_err(|e| HarnessError::io(output, e))?;

        tracing::debug!(
            tool = %filter.name,
            program = %filter.program,
            output = %output.display(),
            "Launching filter"
        );

        let child = Command::new(&filter.program)
            .args(&filter.args)
            .stdin(stdin)
            .stdout(Stdio::from(sink))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::Launch {
                tool: filter.name.clone(),
                source,
            })?;

        Ok(FilterProcess {
            tool: filter.clone(),
            child,
        })
    }
}

/// A running filter. Dropping it kills the process.
pub struct FilterProcess {
    tool: ToolCommand,
    child: Child,
}

impl FilterProcess {
    /// Wait for the filter to exit. Once this returns `Ok`, the output file is
    /// complete and closed.
    pub async fn wait(&mut self) -> Result<()> {
        let status = self.child.wait().await.map_err(|source| HarnessError::Wait {
            tool: self.tool.name.clone(),
            source,
        })?;
        self.tool.check_exit(status)
    }

    /// Kill the process and reap it.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(tool = %self.tool.name, error = %e, "Failed to kill filter");
        }
    }
}
