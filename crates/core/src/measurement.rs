// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement, comparison and summary types.
//!
//! # Invariants
//!
//! - A [`MeasurementRecord`] carries a [`RunFailure`] iff it is unsuccessful.
//!   Both constructors enforce this, and records are immutable afterwards.
//! - Memory deltas are signed and never clamped: the sampled process may
//!   shrink between the two sampling points.
//! - A [`ComparisonMetric`] value of `None` means "not applicable".

use std::time::Duration;
use thiserror::Error;

/// Why a single target run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunFailure {
    /// The executable could not be started.
    #[error("failed to launch: {message}")]
    Launch {
        /// System error text.
        message: String,
    },

    /// The process ran and exited with a non-zero status.
    #[error("exited with code {code}{}", with_diagnostics(.diagnostics))]
    NonZeroExit {
        /// Exit code.
        code: i32,
        /// Captured diagnostic output.
        diagnostics: String,
    },

    /// The process was terminated by a signal.
    #[error("terminated by signal {signal}{}", with_diagnostics(.diagnostics))]
    Signaled {
        /// Signal number.
        signal: i32,
        /// Captured diagnostic output.
        diagnostics: String,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("timed out after {} ms", millis(.after))]
    TimedOut {
        /// Timeout that was exceeded.
        after: Duration,
    },
}

fn millis(duration: &Duration) -> u128 {
    duration.as_millis()
}

fn with_diagnostics(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(": {}", diagnostics)
    }
}

/// Timing, memory and outcome data for one target's single run.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    target: String,
    duration: Duration,
    memory_before: u64,
    memory_after: u64,
    failure: Option<RunFailure>,
}

impl MeasurementRecord {
    /// Record a run that exited with status 0.
    pub fn success(
        target: impl Into<String>,
        duration: Duration,
        memory_before: u64,
        memory_after: u64,
    ) -> Self {
        Self {
            target: target.into(),
            duration,
            memory_before,
            memory_after,
            failure: None,
        }
    }

    /// Record a run that failed for the given reason.
    pub fn failure(
        target: impl Into<String>,
        duration: Duration,
        memory_before: u64,
        memory_after: u64,
        failure: RunFailure,
    ) -> Self {
        Self {
            target: target.into(),
            duration,
            memory_before,
            memory_after,
            failure: Some(failure),
        }
    }

    /// Target name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Elapsed wall-clock time between the two sampling points.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Elapsed time in fractional milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    /// Memory sample taken immediately before launch, in bytes.
    pub fn memory_before(&self) -> u64 {
        self.memory_before
    }

    /// Memory sample taken immediately after exit, in bytes.
    pub fn memory_after(&self) -> u64 {
        self.memory_after
    }

    /// Signed memory delta in bytes (`after - before`).
    pub fn memory_delta(&self) -> i64 {
        (self.memory_after as i64).wrapping_sub(self.memory_before as i64)
    }

    /// Whether the target exited with status 0.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure reason, present iff the run was unsuccessful.
    pub fn failure_reason(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    /// Human-readable error description, present iff the run was unsuccessful.
    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Derived comparison between two successful records.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMetric {
    /// Name of the earlier record.
    pub baseline: String,
    /// Name of the later record.
    pub candidate: String,
    /// `duration(baseline) / duration(candidate)`.
    pub speed_ratio: Option<f64>,
    /// `(mem(baseline) - mem(candidate)) / mem(baseline) * 100`.
    ///
    /// The sign follows the formula, so with a negative baseline delta a
    /// positive value does not mean the candidate used less memory. Use
    /// [`ComparisonMetric::memory_order`] for the direction.
    pub memory_delta_percent: Option<f64>,
    /// Signed memory delta of the baseline, in bytes.
    pub baseline_memory_delta: i64,
    /// Signed memory delta of the candidate, in bytes.
    pub candidate_memory_delta: i64,
}

impl ComparisonMetric {
    /// How the candidate's memory delta compares to the baseline's.
    ///
    /// `Less` means the candidate used less memory.
    pub fn memory_order(&self) -> std::cmp::Ordering {
        self.candidate_memory_delta.cmp(&self.baseline_memory_delta)
    }
}

/// Success flag of one target, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    /// Target name.
    pub name: String,
    /// Whether the run succeeded.
    pub success: bool,
}

/// Aggregate over all measurement records of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSummary {
    /// Number of workload artifacts the targets ran against.
    pub workload_count: usize,
    /// Per-target success flags, in input order.
    pub targets: Vec<TargetOutcome>,
    /// Pairwise comparisons between successful records.
    pub comparisons: Vec<ComparisonMetric>,
}

impl BenchmarkSummary {
    /// The head-to-head comparison of a two-target run.
    ///
    /// Returns `None` unless exactly two targets were run. Returns
    /// `Some(None)` when they were, but at least one of them failed.
    pub fn head_to_head(&self) -> Option<Option<&ComparisonMetric>> {
        if self.targets.len() == 2 {
            Some(self.comparisons.first())
        } else {
            None
        }
    }

    /// Speed ratio of a two-target run. See [`Self::head_to_head`].
    pub fn speedup_ratio(&self) -> Option<Option<f64>> {
        self.head_to_head()
            .map(|metric| metric.and_then(|m| m.speed_ratio))
    }

    /// Memory reduction percentage of a two-target run.
    pub fn memory_reduction(&self) -> Option<Option<f64>> {
        self.head_to_head()
            .map(|metric| metric.and_then(|m| m.memory_delta_percent))
    }

    /// Number of targets that succeeded.
    pub fn success_count(&self) -> usize {
        self.targets.iter().filter(|t| t.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_record_has_no_error() {
        let record = MeasurementRecord::success("tsc", Duration::from_millis(500), 100, 300);
        assert!(record.is_success());
        assert!(record.error_message().is_none());
        assert_eq!(record.memory_delta(), 200);
        assert_eq!(record.duration_ms(), 500.0);
    }

    #[test]
    fn test_negative_memory_delta_is_preserved() {
        let record = MeasurementRecord::success("tsc", Duration::ZERO, 5_000, 1_000);
        assert_eq!(record.memory_delta(), -4_000);
    }

    #[test]
    fn test_failure_record_has_error() {
        let record = MeasurementRecord::failure(
            "tsc",
            Duration::from_millis(3),
            0,
            0,
            RunFailure::Launch {
                message: "No such file or directory (os error 2)".to_string(),
            },
        );
        assert!(!record.is_success());
        let message = record.error_message().unwrap();
        assert!(message.contains("failed to launch"));
        assert!(message.contains("os error 2"));
    }

    #[test]
    fn test_non_zero_exit_message_includes_code_and_output() {
        let failure = RunFailure::NonZeroExit {
            code: 2,
            diagnostics: "error TS2304: Cannot find name 'x'".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "exited with code 2: error TS2304: Cannot find name 'x'"
        );

        let bare = RunFailure::NonZeroExit {
            code: 1,
            diagnostics: String::new(),
        };
        assert_eq!(bare.to_string(), "exited with code 1");
    }

    #[test]
    fn test_timeout_is_distinct_from_exit() {
        let failure = RunFailure::TimedOut {
            after: Duration::from_millis(1500),
        };
        assert_eq!(failure.to_string(), "timed out after 1500 ms");
    }

    #[test]
    fn test_head_to_head_requires_two_targets() {
        let summary = BenchmarkSummary {
            workload_count: 1,
            targets: vec![TargetOutcome {
                name: "a".to_string(),
                success: true,
            }],
            comparisons: vec![],
        };
        assert_eq!(summary.speedup_ratio(), None);

        let summary = BenchmarkSummary {
            workload_count: 1,
            targets: vec![
                TargetOutcome {
                    name: "a".to_string(),
                    success: true,
                },
                TargetOutcome {
                    name: "b".to_string(),
                    success: false,
                },
            ],
            comparisons: vec![],
        };
        assert_eq!(summary.speedup_ratio(), Some(None));
        assert_eq!(summary.success_count(), 1);
    }
}
