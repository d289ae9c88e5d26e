//! Compiler process launch.

use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, Command};

use crate::error::{HarnessError, Result};
use crate::tool::ToolCommand;

/// Launches the compiler under test.
pub struct ProcessRunner;

impl ProcessRunner {
    /// Spawn `program args... input` with only stderr piped.
    ///
    /// The input path is passed through untouched; a bad path is the
    /// compiler's problem to report. Stdout is discarded.
    pub fn spawn(compiler: &ToolCommand, input: &Path) -> Result<CompilerProcess> {
        tracing::debug!(
            tool = %compiler.name,
            program = %compiler.program,
            input = %input.display(),
            "Launching compiler"
        );

        let child = Command::new(&compiler.program)
            .args(&compiler.args)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::Launch {
                tool: compiler.name.clone(),
                source,
            })?;

        Ok(CompilerProcess {
            tool: compiler.clone(),
            child,
        })
    }
}

/// A running compiler. Dropping it kills the process.
pub struct CompilerProcess {
    tool: ToolCommand,
    child: Child,
}

impl CompilerProcess {
    /// Take the stderr pipe. Only the first call succeeds.
    pub fn take_stderr(&mut self) -> Result<ChildStderr> {
        self.child.stderr.take().ok_or_else(|| HarnessError::StderrTaken {
            tool: self.tool.name.clone(),
        })
    }

    /// Wait for the compiler to exit and apply its exit policy.
    ///
    /// Returns the raw exit code for logging; it never feeds the verdict.
    pub async fn wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait().await.map_err(|source| HarnessError::Wait {
            tool: self.tool.name.clone(),
            source,
        })?;
        self.tool.check_exit(status)?;
        Ok(status.code())
    }

    /// Whether the process has not exited yet.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the process and reap it.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(tool = %self.tool.name, error = %e, "Failed to kill compiler");
        }
    }
}
