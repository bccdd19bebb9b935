// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness configuration.
//!
//! A run always starts from [`HarnessConfig::default`]. Caller input arrives
//! as one or more [`HarnessOverrides`] layers (config file, environment, CLI
//! flags) which are applied field by field: an absent field keeps the value
//! below it, it is never an error.
//!
//! # Example
//!
//! ```
//! use compbench_core::config::{HarnessConfig, HarnessOverrides};
//!
//! let overrides = HarnessOverrides {
//!     workload_count: Some(10),
//!     ..Default::default()
//! };
//! let config = HarnessConfig::default().apply(overrides);
//! assert_eq!(config.workload_count, 10);
//! ```

use crate::error::{HarnessError, Result};
use crate::target::TargetSpec;
use crate::workload::WorkloadSize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Report keys that live next to the per-target success flags in the
/// report summary and therefore cannot be used as target names.
pub const RESERVED_TARGET_NAMES: &[&str] = &["testFilesCount", "speedupRatio", "memoryReduction"];

/// Default number of workload artifacts.
pub const DEFAULT_WORKLOAD_COUNT: usize = 50;

/// Fully resolved harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarnessConfig {
    /// Number of workload artifacts to generate.
    pub workload_count: usize,
    /// Size class of each artifact.
    pub workload_size: WorkloadSize,
    /// Directory under which each run creates its workload directory.
    pub work_dir: PathBuf,
    /// File name prefix of generated artifacts.
    pub file_prefix: String,
    /// File extension of generated artifacts, without the dot.
    pub file_extension: String,
    /// Maximum number of concurrent artifact writes.
    pub parallelism: usize,
    /// Location of the JSON report.
    pub output_path: PathBuf,
    /// Also write a markdown summary next to the JSON report.
    pub markdown_summary: bool,
    /// Per-target wall-clock limit. `None` waits indefinitely.
    pub target_timeout: Option<Duration>,
    /// Targets to benchmark, in run order.
    pub targets: Vec<TargetSpec>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workload_count: DEFAULT_WORKLOAD_COUNT,
            workload_size: WorkloadSize::Small,
            work_dir: PathBuf::from("bench-workload"),
            file_prefix: "module".to_string(),
            file_extension: "ts".to_string(),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            output_path: PathBuf::from("benchmark-results.json"),
            markdown_summary: false,
            target_timeout: None,
            targets: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Apply an override layer on top of this configuration.
    pub fn apply(mut self, overrides: HarnessOverrides) -> Self {
        if let Some(count) = overrides.workload_count {
            self.workload_count = count;
        }
        if let Some(size) = overrides.workload_size {
            self.workload_size = size;
        }
        if let Some(dir) = overrides.work_dir {
            self.work_dir = dir;
        }
        if let Some(prefix) = overrides.file_prefix {
            self.file_prefix = prefix;
        }
        if let Some(ext) = overrides.file_extension {
            self.file_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(parallelism) = overrides.parallelism {
            self.parallelism = parallelism;
        }
        if let Some(path) = overrides.output_path {
            self.output_path = path;
        }
        if let Some(markdown) = overrides.markdown_summary {
            self.markdown_summary = markdown;
        }
        if let Some(ms) = overrides.target_timeout_ms {
            self.target_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(targets) = overrides.targets {
            self.targets = targets;
        }
        self
    }

    /// Check that the configuration describes a runnable request.
    pub fn validate(&self) -> Result<()> {
        if self.workload_count == 0 {
            return Err(HarnessError::invalid_argument(
                "workload count must be at least 1",
            ));
        }
        if self.parallelism == 0 {
            return Err(HarnessError::invalid_argument(
                "parallelism must be at least 1",
            ));
        }
        if self.target_timeout == Some(Duration::ZERO) {
            return Err(HarnessError::invalid_argument(
                "target timeout must be greater than zero",
            ));
        }
        if self.file_prefix.is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(HarnessError::invalid_argument(format!(
                "invalid file prefix '{}'",
                self.file_prefix
            )));
        }
        if self.targets.is_empty() {
            return Err(HarnessError::invalid_argument(
                "at least one target is required",
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            target.validate()?;
            if RESERVED_TARGET_NAMES.contains(&target.name()) {
                return Err(HarnessError::invalid_argument(format!(
                    "target name '{}' is reserved",
                    target.name()
                )));
            }
            if !seen.insert(target.name()) {
                return Err(HarnessError::invalid_argument(format!(
                    "duplicate target name '{}'",
                    target.name()
                )));
            }
        }
        Ok(())
    }
}

/// One layer of caller-supplied configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarnessOverrides {
    /// Number of workload artifacts.
    pub workload_count: Option<usize>,
    /// Size class of each artifact.
    pub workload_size: Option<WorkloadSize>,
    /// Working directory.
    pub work_dir: Option<PathBuf>,
    /// Artifact file name prefix.
    pub file_prefix: Option<String>,
    /// Artifact file extension.
    pub file_extension: Option<String>,
    /// Concurrent artifact writes.
    pub parallelism: Option<usize>,
    /// JSON report location.
    pub output_path: Option<PathBuf>,
    /// Write a markdown summary.
    pub markdown_summary: Option<bool>,
    /// Per-target timeout in milliseconds.
    pub target_timeout_ms: Option<u64>,
    /// Targets to benchmark. Replaces the whole list when present.
    pub targets: Option<Vec<TargetSpec>>,
}
