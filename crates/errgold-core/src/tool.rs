//! External tool definitions: the compiler under test and the normalizing filter.

use std::process::ExitStatus;

use crate::error::{HarnessError, Result};

/// Flags passed to verilator ahead of the input file.
const VERILATOR_ARGS: &[&str] = &[
    "--cc",
    "--autoflush",
    "--timescale",
    "1ns/1ps",
    "--timing",
    "--top-module",
    "caliptra_top_tb",
    "-Wno-WIDTH",
    "-Wno-UNOPTFLAT",
    "-Wno-LITENDIAN",
    "-Wno-CMPCONST",
    "-Wno-MULTIDRIVEN",
    "-Wno-UNPACKED",
    "-Wno-ALWCOMBORDER",
];

/// What to do with a tool's exit status once it has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// The status is intentionally discarded. The compiler under test is
    /// expected to fail; its failure is what gets captured.
    Ignore,

    /// A non-zero status aborts the run with [`HarnessError::ToolFailed`].
    RequireSuccess,
}

/// One external tool invocation: program, fixed argument template, exit policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Human-readable name used in logs and errors.
    pub name: String,

    /// Executable, resolved through `PATH`.
    pub program: String,

    /// Fixed arguments. Callers may append a variable argument at launch.
    pub args: Vec<String>,

    /// Exit status handling.
    pub exit_policy: ExitPolicy,
}

impl ToolCommand {
    /// The verilator invocation this harness was built around.
    pub fn verilator() -> Self {
        Self {
            name: "compiler".to_string(),
            program: "verilator".to_string(),
            args: VERILATOR_ARGS.iter().map(|a| a.to_string()).collect(),
            exit_policy: ExitPolicy::Ignore,
        }
    }

    /// Filter that strips volatile metadata from verilator error messages.
    pub fn strip_verilator_errmsg() -> Self {
        Self {
            name: "filter".to_string(),
            program: "sv-bugpoint-strip-verilator-errmsg".to_string(),
            args: Vec::new(),
            exit_policy: ExitPolicy::RequireSuccess,
        }
    }

    /// Build a command from an argv vector (first element is the executable).
    pub fn custom(name: impl Into<String>, command: Vec<String>, exit_policy: ExitPolicy) -> Result<Self> {
        let name = name.into();
        let mut argv = command.into_iter();
        let program = argv
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| HarnessError::InvalidConfig(format!("{name} has empty command")))?;

        Ok(Self {
            name,
            program,
            args: argv.collect(),
            exit_policy,
        })
    }

    /// Apply this tool's exit policy to a finished process.
    pub fn check_exit(&self, status: ExitStatus) -> Result<()> {
        match self.exit_policy {
            ExitPolicy::Ignore => {
                tracing::debug!(tool = %self.name, code = ?status.code(), "exit status discarded");
                Ok(())
            }
            ExitPolicy::RequireSuccess if status.success() => Ok(()),
            ExitPolicy::RequireSuccess => Err(HarnessError::ToolFailed {
                tool: self.name.clone(),
                code: status.code(),
            }),
        }
    }
}
