// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the compbench harness.
//!
//! This crate holds the data model shared by every harness stage:
//!
//! - [`target`] - immutable descriptors of the executables under test
//! - [`workload`] - generated input artifacts and their size classes
//! - [`measurement`] - per-target records, comparisons and the run summary
//! - [`config`] - default configuration and override layers
//! - [`error`] - the harness error taxonomy

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod measurement;
pub mod target;
pub mod workload;

pub use config::{HarnessConfig, HarnessOverrides};
pub use error::{CleanupFailure, HarnessError, Result};
pub use measurement::{
    BenchmarkSummary, ComparisonMetric, MeasurementRecord, RunFailure, TargetOutcome,
};
pub use target::TargetSpec;
pub use workload::{WorkloadArtifact, WorkloadSize};
