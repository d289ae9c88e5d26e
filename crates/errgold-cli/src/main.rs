//! errgold - golden-file check for compiler diagnostics
//!
//! Runs the compiler on one input file, normalizes its stderr through a filter
//! process, and compares the result with the recorded golden output.
//!
//! ## Exit codes
//!
//! - `0`: normalized output matches `golden_stderr`
//! - `1`: mismatch (even when the golden file was just updated), an aborted
//!   run, or a usage error
//!
//! Set `GOLDEN=1` (or pass `--update`) to replace the golden file on mismatch.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use errgold_core::harness::{DEFAULT_ACTUAL_PATH, DEFAULT_GOLDEN_PATH, DEFAULT_TIMEOUT_SECS};
use errgold_core::{
    promotion_requested_by_env, ExitPolicy, Harness, HarnessConfig, RunReport, ToolCommand,
};

#[derive(Parser, Debug)]
#[command(name = "errgold")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare a compiler's normalized diagnostics against a golden file", long_about = None)]
struct Cli {
    /// Source file passed to the compiler
    input: PathBuf,

    /// Golden reference file
    #[arg(long, env = "ERRGOLD_GOLDEN", default_value = DEFAULT_GOLDEN_PATH)]
    golden: PathBuf,

    /// Normalized output file (rewritten on every run)
    #[arg(long, env = "ERRGOLD_ACTUAL", default_value = DEFAULT_ACTUAL_PATH)]
    actual: PathBuf,

    /// Compiler executable (default: verilator)
    #[arg(long, env = "ERRGOLD_COMPILER")]
    compiler: Option<String>,

    /// Fixed compiler argument, repeatable; replaces the built-in flag set
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    compiler_args: Vec<String>,

    /// Filter executable (default: sv-bugpoint-strip-verilator-errmsg)
    #[arg(long, env = "ERRGOLD_FILTER")]
    filter: Option<String>,

    /// Filter argument, repeatable
    #[arg(long = "filter-arg", value_name = "ARG", allow_hyphen_values = true)]
    filter_args: Vec<String>,

    /// Abort when compiler and filter take longer than this (0 = no limit)
    #[arg(long, env = "ERRGOLD_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Replace the golden file on mismatch (also enabled by a non-empty GOLDEN)
    #[arg(long)]
    update: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Never color the diff
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Apply command-line overrides to a built-in tool.
///
/// Naming a program drops the built-in arguments; extra arguments alone
/// replace them for the built-in program.
fn resolve_tool(
    builtin: ToolCommand,
    program: Option<&str>,
    args: &[String],
    exit_policy: ExitPolicy,
) -> Result<ToolCommand> {
    if program.is_none() && args.is_empty() {
        return Ok(builtin);
    }

    let mut argv = vec![program.unwrap_or(&builtin.program).to_string()];
    argv.extend(args.iter().cloned());
    Ok(ToolCommand::custom(builtin.name, argv, exit_policy)?)
}

fn build_config(cli: &Cli, env_update: bool) -> Result<HarnessConfig> {
    let compiler = resolve_tool(
        ToolCommand::verilator(),
        cli.compiler.as_deref(),
        &cli.compiler_args,
        ExitPolicy::Ignore,
    )
    .context("Invalid compiler command")?;

    let filter = resolve_tool(
        ToolCommand::strip_verilator_errmsg(),
        cli.filter.as_deref(),
        &cli.filter_args,
        ExitPolicy::RequireSuccess,
    )
    .context("Invalid filter command")?;

    Ok(HarnessConfig {
        compiler,
        filter,
        golden_path: cli.golden.clone(),
        actual_path: cli.actual.clone(),
        timeout_secs: cli.timeout_secs,
        promote_on_mismatch: cli.update || env_update,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return Ok(ExitCode::FAILURE);
        }
    };

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    errgold_core::init_tracing(cli.json, level);

    let config = build_config(&cli, promotion_requested_by_env())?;
    let harness = Harness::new(config);

    let mut stdout = std::io::stdout().lock();
    let outcome = harness
        .run(&cli.input, &mut stdout)
        .await
        .context("Golden check aborted")?;

    if let Some(path) = &cli.report {
        RunReport::new(&outcome, &cli.input, harness.config())
            .write_to(path)
            .context("Failed to write run report")?;
    }

    Ok(ExitCode::from(outcome.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("errgold").chain(args.iter().copied()))
            .expect("parse failed")
    }

    #[test]
    fn test_defaults_use_builtin_tools() {
        let cli = parse(&["top.sv"]);
        let config = build_config(&cli, false).unwrap();

        assert_eq!(config.compiler, ToolCommand::verilator());
        assert_eq!(config.filter, ToolCommand::strip_verilator_errmsg());
        assert!(!config.promote_on_mismatch);
        assert_eq!(cli.input, PathBuf::from("top.sv"));
    }

    #[test]
    fn test_custom_compiler_drops_builtin_args() {
        let cli = parse(&[
            "top.sv",
            "--compiler",
            "sh",
            "--compiler-arg",
            "-c",
            "--compiler-arg",
            "cat \"$1\" >&2",
        ]);
        let config = build_config(&cli, false).unwrap();

        assert_eq!(config.compiler.program, "sh");
        assert_eq!(config.compiler.args, vec!["-c", "cat \"$1\" >&2"]);
        assert_eq!(config.compiler.exit_policy, ExitPolicy::Ignore);
    }

    #[test]
    fn test_args_alone_replace_builtin_template() {
        let cli = parse(&["top.sv", "--compiler-arg=--lint-only"]);
        let config = build_config(&cli, false).unwrap();

        assert_eq!(config.compiler.program, "verilator");
        assert_eq!(config.compiler.args, vec!["--lint-only"]);
    }

    #[test]
    fn test_custom_filter_must_succeed() {
        let cli = parse(&["top.sv", "--filter", "cat"]);
        let config = build_config(&cli, false).unwrap();

        assert_eq!(config.filter.program, "cat");
        assert!(config.filter.args.is_empty());
        assert_eq!(config.filter.exit_policy, ExitPolicy::RequireSuccess);
    }

    #[test]
    fn test_update_from_flag_or_env() {
        let cli = parse(&["top.sv", "--update"]);
        assert!(build_config(&cli, false).unwrap().promote_on_mismatch);

        let cli = parse(&["top.sv"]);
        assert!(build_config(&cli, true).unwrap().promote_on_mismatch);
    }

    #[test]
    fn test_empty_compiler_rejected() {
        let cli = parse(&["top.sv", "--compiler", ""]);
        assert!(build_config(&cli, false).is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["errgold"]).is_err());
    }
}
