//! CLI for compbench.
//!
//! This crate provides the `compbench` command-line interface: the `run`
//! subcommand drives a full benchmark and `status` shows the configuration a
//! run would use.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use compbench_benchmarks::{Harness, HarnessOutcome};
use compbench_core::{HarnessOverrides, TargetSpec, WorkloadSize};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// compbench CLI.
#[derive(Parser, Debug)]
#[command(name = "compbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Format of log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a workload, run every target against it and write a report.
    ///
    /// Targets are given as `name=command args...`, either with `--target`
    /// or in the config file. The first target is the baseline of each
    /// comparison.
    Run(RunArgs),

    /// Show the resolved configuration without running anything.
    Status {
        /// Configuration file (TOML, YAML or JSON).
        #[arg(short, long, env = "COMPBENCH_CONFIG")]
        config: Option<PathBuf>,

        /// Show the full configuration.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Arguments of the `run` subcommand.
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, env = "COMPBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of workload artifacts to generate.
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Artifact size: small, medium or large.
    #[arg(short, long)]
    pub size: Option<WorkloadSize>,

    /// Directory in which the workload is generated.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// JSON report location.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a markdown summary next to the report.
    #[arg(long, overrides_with = "no_markdown")]
    pub markdown: bool,

    /// Do not write a markdown summary, even if the config file asks for one.
    #[arg(long, overrides_with = "markdown")]
    pub no_markdown: bool,

    /// Kill a target after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Maximum concurrent artifact writes.
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Target as `name=command args...`. Repeat for each target.
    #[arg(short, long = "target")]
    pub targets: Vec<TargetSpec>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunArgs {
    /// The override layer expressed by the flags that were given.
    pub fn overrides(&self) -> HarnessOverrides {
        HarnessOverrides {
            workload_count: self.count,
            workload_size: self.size,
            work_dir: self.work_dir.clone(),
            output_path: self.output.clone(),
            markdown_summary: match (self.markdown, self.no_markdown) {
                (true, _) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            },
            target_timeout_ms: self.timeout_ms,
            parallelism: self.parallelism,
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            ..Default::default()
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_tracing(format: LogFormat, verbose: bool) {
    let default_directive = if verbose {
        "compbench=debug"
    } else {
        "compbench=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed when embedded; keep it.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` once the harness completed, even when targets failed, or
/// an error if the run could not be carried out.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_tracing(cli.log_format, args.verbose);
            run_command(args).await
        }
        Commands::Status { config, detailed } => {
            init_tracing(cli.log_format, false);
            status_command(config, detailed)
        }
    }
}

async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = settings::resolve(args.config.as_deref(), args.overrides())?;
    debug!(
        workload_count = config.workload_count,
        targets = config.targets.len(),
        "Resolved configuration"
    );

    let outcome = Harness::new(config)
        .run()
        .await
        .context("benchmark run failed")?;

    println!("{}", outcome.report.text);
    print_outcome(&outcome, args.verbose);
    Ok(())
}

fn print_outcome(outcome: &HarnessOutcome, verbose: bool) {
    println!(
        "{} {}",
        "Report written to".green(),
        outcome.report_path.display()
    );
    if let Some(path) = &outcome.markdown_path {
        println!("{} {}", "Summary written to".green(), path.display());
    }

    let failed = outcome.records.len() - outcome.summary.success_count();
    if failed > 0 {
        println!(
            "{}",
            format!("{} of {} targets failed", failed, outcome.records.len()).red()
        );
    }

    for failure in &outcome.cleanup_failures {
        println!("{} {}", "warning: cleanup failed:".yellow(), failure);
    }

    if verbose {
        println!("\nRun {}", outcome.run_id);
        let states: Vec<String> = outcome.states.iter().map(|s| s.to_string()).collect();
        println!("  states: {}", states.join(" -> "));
        for record in &outcome.records {
            let status = if record.is_success() {
                "ok".green()
            } else {
                "failed".red()
            };
            println!("  - {}: {}", record.target(), status);
        }
    }

    info!(run_id = %outcome.run_id, "Run complete");
}

fn status_command(config: Option<PathBuf>, detailed: bool) -> anyhow::Result<()> {
    let resolved = settings::resolve(config.as_deref(), HarnessOverrides::default())?;

    println!("compbench");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Targets: {}", resolved.targets.len());
    for target in &resolved.targets {
        println!("  - {}", target);
    }
    match resolved.validate() {
        Ok(()) => println!("Configuration: {}", "ready".green()),
        Err(e) => println!("Configuration: {} ({})", "incomplete".yellow(), e),
    }

    if detailed {
        let json = serde_json::to_string_pretty(&resolved)
            .context("failed to serialize configuration")?;
        println!("\n{}", json);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_targets() {
        let cli = Cli::try_parse_from([
            "compbench",
            "run",
            "-n",
            "5",
            "--size",
            "large",
            "--target",
            "tsc=npx tsc --noEmit",
            "-t",
            "swc=npx swc src",
            "--markdown",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.count, Some(5));
        assert_eq!(args.size, Some(WorkloadSize::Large));
        assert_eq!(args.targets.len(), 2);
        assert_eq!(args.targets[0].name(), "tsc");
        assert_eq!(args.targets[1].args(), ["swc", "src"]);
        assert!(args.markdown);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_parse_rejects_malformed_target() {
        assert!(Cli::try_parse_from(["compbench", "run", "--target", "no-command"]).is_err());
        assert!(Cli::try_parse_from(["compbench", "run", "--size", "huge"]).is_err());
    }

    #[test]
    fn test_global_log_format() {
        let cli =
            Cli::try_parse_from(["compbench", "status", "--log-format", "json", "--detailed"])
                .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Status { detailed: true, .. }
        ));
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let overrides = RunArgs::default().overrides();
        assert_eq!(overrides, HarnessOverrides::default());

        let overrides = RunArgs {
            markdown: true,
            timeout_ms: Some(500),
            ..Default::default()
        }
        .overrides();
        assert_eq!(overrides.markdown_summary, Some(true));
        assert_eq!(overrides.target_timeout_ms, Some(500));
        assert!(overrides.targets.is_none());
    }

    #[test]
    fn test_no_markdown_turns_off_config_file_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compbench.toml");
        std::fs::write(&path, "markdown_summary = true\n").unwrap();

        let cli = Cli::try_parse_from(["compbench", "run", "--no-markdown"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.overrides().markdown_summary, Some(false));

        let config = settings::resolve(Some(&path), args.overrides()).unwrap();
        assert!(!config.markdown_summary);

        let config = settings::resolve(Some(&path), RunArgs::default().overrides()).unwrap();
        assert!(config.markdown_summary);
    }

    #[test]
    fn test_last_markdown_flag_wins() {
        let cli =
            Cli::try_parse_from(["compbench", "run", "--markdown", "--no-markdown"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.overrides().markdown_summary, Some(false));
    }
}
