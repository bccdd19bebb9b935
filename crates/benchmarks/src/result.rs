//! Persisted report document.
//!
//! This module provides the machine-readable form of a harness run. Field
//! names are camelCase on the wire.

use chrono::{DateTime, Utc};
use compbench_core::{BenchmarkSummary, ComparisonMetric, MeasurementRecord};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Machine-readable report of one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    /// Identifier of the run that produced this report.
    pub run_id: Uuid,
    /// Time the report was generated.
    pub timestamp: DateTime<Utc>,
    /// One entry per target, in run order.
    pub results: Vec<TargetResult>,
    /// Run-level summary.
    pub summary: ReportSummary,
    /// Pairwise comparisons between successful targets.
    #[serde(default)]
    pub comparisons: Vec<ComparisonEntry>,
}

/// Measurement of one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    /// Target name.
    pub target: String,
    /// Wall-clock duration in milliseconds.
    pub execution_time: f64,
    /// Signed memory delta in bytes.
    pub memory_usage: i64,
    /// Whether the target exited with status 0.
    pub success: bool,
    /// Failure description, present only when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl From<&MeasurementRecord> for TargetResult {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            target: record.target().to_string(),
            execution_time: record.duration_ms(),
            memory_usage: record.memory_delta(),
            success: record.is_success(),
            error_message: record.error_message(),
        }
    }
}

/// Run-level summary.
///
/// `speedupRatio` and `memoryReduction` are only present when exactly two
/// targets ran; they are `null` when either of the two failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Number of workload artifacts.
    pub test_files_count: usize,
    /// Head-to-head speed ratio of a two-target run.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "present"
    )]
    pub speedup_ratio: Option<Option<f64>>,
    /// Head-to-head memory reduction percentage of a two-target run.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "present"
    )]
    pub memory_reduction: Option<Option<f64>>,
    /// Success flag per target, keyed by target name.
    #[serde(flatten)]
    pub targets: BTreeMap<String, bool>,
}

impl From<&BenchmarkSummary> for ReportSummary {
    fn from(summary: &BenchmarkSummary) -> Self {
        Self {
            test_files_count: summary.workload_count,
            speedup_ratio: summary.speedup_ratio(),
            memory_reduction: summary.memory_reduction(),
            targets: summary
                .targets
                .iter()
                .map(|t| (t.name.clone(), t.success))
                .collect(),
        }
    }
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// One pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    /// Earlier target.
    pub baseline: String,
    /// Later target.
    pub candidate: String,
    /// `duration(baseline) / duration(candidate)`, `null` if not applicable.
    pub speed_ratio: Option<f64>,
    /// Memory difference relative to the baseline, `null` if not applicable.
    pub memory_delta_percent: Option<f64>,
}

impl From<&ComparisonMetric> for ComparisonEntry {
    fn from(metric: &ComparisonMetric) -> Self {
        Self {
            baseline: metric.baseline.clone(),
            candidate: metric.candidate.clone(),
            speed_ratio: metric.speed_ratio,
            memory_delta_percent: metric.memory_delta_percent,
        }
    }
}

impl BenchmarkReport {
    /// Build the report document.
    pub fn new(
        run_id: Uuid,
        timestamp: DateTime<Utc>,
        summary: &BenchmarkSummary,
        records: &[MeasurementRecord],
    ) -> Self {
        Self {
            run_id,
            timestamp,
            results: records.iter().map(TargetResult::from).collect(),
            summary: ReportSummary::from(summary),
            comparisons: summary.comparisons.iter().map(ComparisonEntry::from).collect(),
        }
    }
}
