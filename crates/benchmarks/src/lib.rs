//! Comparative benchmarking of external compiler executables.
//!
//! This crate generates a synthetic workload, runs each target executable
//! against it exactly once, measures wall-clock time and memory delta, and
//! reports how the targets compare.
//!
//! # Quick Start
//!
//! ```no_run
//! use compbench_benchmarks::run_benchmarks;
//! use compbench_core::{HarnessConfig, TargetSpec};
//!
//! # async fn example() -> compbench_core::Result<()> {
//! let config = HarnessConfig {
//!     workload_count: 20,
//!     targets: vec![
//!         TargetSpec::new("tsc", "npx", ["tsc", "--noEmit", "-p", "."])?,
//!         TargetSpec::new("swc", "npx", ["swc", "bench-workload", "-d", "out"])?,
//!     ],
//!     ..Default::default()
//! };
//!
//! let outcome = run_benchmarks(config).await?;
//! println!("{}", outcome.report.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`workload`] - workload artifact generation and deletion
//! - [`runner`] - single-target execution with time and memory sampling
//! - [`memory`] - memory samplers
//! - [`aggregate`] - summary and pairwise comparisons
//! - [`report`] - human-readable rendering
//! - [`result`] - the persisted report document
//! - [`markdown`] - markdown summary generation
//! - [`io`] - reading and writing reports
//! - [`harness`] - the orchestrator tying everything together

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod harness;
pub mod io;
pub mod markdown;
pub mod memory;
pub mod report;
pub mod result;
pub mod runner;
pub mod workload;

pub use harness::{Harness, HarnessOutcome, HarnessState};
pub use report::RenderedReport;
pub use result::BenchmarkReport;
pub use runner::TargetRunner;
pub use workload::WorkloadGenerator;

use compbench_core::{HarnessConfig, Result};

/// Run a full benchmark with the host memory sampler.
///
/// This is the canonical entrypoint: it generates the workload, runs every
/// target, writes the report and removes the workload again.
///
/// # Errors
///
/// See [`Harness::run`].
pub async fn run_benchmarks(config: HarnessConfig) -> Result<HarnessOutcome> {
    Harness::new(config).run().await
}
