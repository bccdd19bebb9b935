//! Result aggregation and comparison arithmetic.
//!
//! Pairs are formed in input order: for records `i < j` the earlier record is
//! the baseline and the later one the candidate. Only pairs where both runs
//! succeeded are compared.

use compbench_core::{BenchmarkSummary, ComparisonMetric, MeasurementRecord, TargetOutcome};

/// Compare two records.
///
/// Returns `None` unless both succeeded. Within the metric, a ratio whose
/// denominator is zero is `None` rather than infinite or zero.
pub fn compare(
    baseline: &MeasurementRecord,
    candidate: &MeasurementRecord,
) -> Option<ComparisonMetric> {
    if !baseline.is_success() || !candidate.is_success() {
        return None;
    }

    let candidate_secs = candidate.duration().as_secs_f64();
    let speed_ratio = if candidate_secs > 0.0 {
        Some(baseline.duration().as_secs_f64() / candidate_secs)
    } else {
        None
    };

    let baseline_memory = baseline.memory_delta();
    let memory_delta_percent = if baseline_memory != 0 {
        let difference = baseline_memory as f64 - candidate.memory_delta() as f64;
        Some(difference / baseline_memory as f64 * 100.0)
    } else {
        None
    };

    Some(ComparisonMetric {
        baseline: baseline.target().to_string(),
        candidate: candidate.target().to_string(),
        speed_ratio,
        memory_delta_percent,
        baseline_memory_delta: baseline_memory,
        candidate_memory_delta: candidate.memory_delta(),
    })
}

/// Build the run summary from the ordered records.
pub fn aggregate(workload_count: usize, records: &[MeasurementRecord]) -> BenchmarkSummary {
    let targets = records
        .iter()
        .map(|record| TargetOutcome {
            name: record.target().to_string(),
            success: record.is_success(),
        })
        .collect();

    let mut comparisons = Vec::new();
    for (i, baseline) in records.iter().enumerate() {
        for candidate in &records[i + 1..] {
            if let Some(metric) = compare(baseline, candidate) {
                comparisons.push(metric);
            }
        }
    }

    BenchmarkSummary {
        workload_count,
        targets,
        comparisons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compbench_core::RunFailure;
    use std::time::Duration;

    fn ok(name: &str, ms: u64, memory: u64) -> MeasurementRecord {
        MeasurementRecord::success(name, Duration::from_millis(ms), 0, memory)
    }

    fn failed(name: &str) -> MeasurementRecord {
        MeasurementRecord::failure(
            name,
            Duration::from_millis(1),
            0,
            0,
            RunFailure::NonZeroExit {
                code: 1,
                diagnostics: String::new(),
            },
        )
    }

    #[test]
    fn test_two_fast_and_slow_targets() {
        let records = vec![ok("tsc", 500, 1_000_000), ok("swc", 100, 500_000)];

        let summary = aggregate(50, &records);

        assert_eq!(summary.workload_count, 50);
        assert_eq!(summary.comparisons.len(), 1);
        let metric = &summary.comparisons[0];
        assert_eq!(metric.baseline, "tsc");
        assert_eq!(metric.candidate, "swc");
        assert!((metric.speed_ratio.unwrap() - 5.0).abs() < 1e-9);
        assert!((metric.memory_delta_percent.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(summary.speedup_ratio(), Some(metric.speed_ratio));
    }

    #[test]
    fn test_failed_record_voids_comparison() {
        let records = vec![ok("tsc", 500, 10), failed("swc")];

        let summary = aggregate(1, &records);

        assert!(summary.comparisons.is_empty());
        assert_eq!(summary.speedup_ratio(), Some(None));
        assert!(compare(&records[0], &records[1]).is_none());
        assert!(compare(&records[1], &records[0]).is_none());
    }

    #[test]
    fn test_zero_baseline_memory_is_not_applicable() {
        let metric = compare(&ok("a", 200, 0), &ok("b", 100, 4096)).unwrap();
        assert_eq!(metric.memory_delta_percent, None);
        assert!((metric.speed_ratio.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_candidate_duration_is_not_applicable() {
        let metric = compare(&ok("a", 200, 10), &ok("b", 0, 5)).unwrap();
        assert_eq!(metric.speed_ratio, None);
        assert!((metric.memory_delta_percent.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_baseline_keeps_formula_and_deltas() {
        let baseline = MeasurementRecord::success("tsc", Duration::from_millis(10), 2_000, 1_000);
        let candidate = MeasurementRecord::success("swc", Duration::from_millis(10), 1_000, 2_000);

        let metric = compare(&baseline, &candidate).unwrap();

        assert!((metric.memory_delta_percent.unwrap() - 200.0).abs() < 1e-9);
        assert_eq!(metric.baseline_memory_delta, -1_000);
        assert_eq!(metric.candidate_memory_delta, 1_000);
        assert_eq!(metric.memory_order(), std::cmp::Ordering::Greater);
    }

    #[test]
    fn test_every_successful_pair_in_input_order() {
        let records = vec![
            ok("a", 300, 30),
            failed("b"),
            ok("c", 100, 10),
            ok("d", 600, 60),
        ];

        let summary = aggregate(3, &records);

        let pairs: Vec<(&str, &str)> = summary
            .comparisons
            .iter()
            .map(|m| (m.baseline.as_str(), m.candidate.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "c"), ("a", "d"), ("c", "d")]);
        assert_eq!(summary.speedup_ratio(), None);
    }

    #[test]
    fn test_targets_keep_input_order() {
        let records = vec![failed("z"), ok("a", 1, 1), failed("m")];

        let summary = aggregate(1, &records);

        let names: Vec<_> = summary.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        assert_eq!(
            summary.targets.iter().map(|t| t.success).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records = vec![ok("a", 120, 7), ok("b", 80, 3)];
        assert_eq!(aggregate(4, &records), aggregate(4, &records));
    }
}
