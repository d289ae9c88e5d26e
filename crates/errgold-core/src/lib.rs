//! errgold core library
//!
//! Golden-file regression checks for compiler diagnostics:
//! - Runs the compiler under test and streams its stderr through an external
//!   normalizing filter into `actual_stderr`
//! - Compares the result byte-for-byte with `golden_stderr`
//! - Optionally promotes the new output to be the baseline on mismatch

pub mod baseline;
pub mod capture;
pub mod compare;
pub mod error;
pub mod filter;
pub mod harness;
pub mod obs;
pub mod report;
pub mod runner;
pub mod telemetry;
pub mod tool;

pub use baseline::promote;
pub use capture::{capture, CaptureSummary};
pub use compare::{Comparison, GoldenComparator};
pub use error::{HarnessError, Result};
pub use filter::{FilterProcess, StreamFilter};
pub use harness::{
    promotion_requested_by_env, Harness, HarnessConfig, RunOutcome, TerminalState, UPDATE_ENV_VAR,
};
pub use report::RunReport;
pub use runner::{CompilerProcess, ProcessRunner};
pub use telemetry::init_tracing;
pub use tool::{ExitPolicy, ToolCommand};
