//! Report rendering.
//!
//! [`render`] turns a summary and its records into the human-readable text and
//! the machine-readable [`BenchmarkReport`]. It writes nothing anywhere.

use crate::result::BenchmarkReport;
use chrono::{DateTime, Utc};
use compbench_core::{BenchmarkSummary, ComparisonMetric, MeasurementRecord};
use std::cmp::Ordering;
use std::fmt::Write;
use uuid::Uuid;

/// Both renderings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    /// Human-readable text.
    pub text: String,
    /// Machine-readable document.
    pub document: BenchmarkReport,
}

/// Render a run.
pub fn render(
    summary: &BenchmarkSummary,
    records: &[MeasurementRecord],
    run_id: Uuid,
    timestamp: DateTime<Utc>,
) -> RenderedReport {
    RenderedReport {
        text: render_text(summary, records),
        document: BenchmarkReport::new(run_id, timestamp, summary, records),
    }
}

/// Render the human-readable form.
pub fn render_text(summary: &BenchmarkSummary, records: &[MeasurementRecord]) -> String {
    let mut out = String::new();
    let _ = write_text(&mut out, summary, records);
    out
}

fn write_text(
    out: &mut String,
    summary: &BenchmarkSummary,
    records: &[MeasurementRecord],
) -> std::fmt::Result {
    writeln!(
        out,
        "Benchmark results ({} workload files)",
        summary.workload_count
    )?;
    for record in records {
        let glyph = if record.is_success() { "✓" } else { "✗" };
        write!(
            out,
            "  {} {}: {}, memory {}",
            glyph,
            record.target(),
            format_duration_ms(record.duration_ms()),
            format_bytes(record.memory_delta())
        )?;
        if let Some(message) = record.error_message() {
            write!(out, " ({})", message)?;
        }
        writeln!(out)?;
    }

    if !summary.comparisons.is_empty() {
        writeln!(out, "Comparisons")?;
    }
    for metric in &summary.comparisons {
        writeln!(out, "  {}", speed_phrase(metric))?;
        writeln!(out, "  {}", memory_phrase(metric))?;
    }
    Ok(())
}

/// "Y is R.RRx faster/slower than X" for a comparison.
///
/// Ratios that would print as `1.00x` either way read "as fast as".
pub fn speed_phrase(metric: &ComparisonMetric) -> String {
    match metric.speed_ratio {
        Some(ratio) if ratio > 0.0 && ratio.max(1.0 / ratio) < 1.005 => format!(
            "{} is as fast as {}",
            metric.candidate, metric.baseline
        ),
        Some(ratio) if ratio >= 1.0 => format!(
            "{} is {:.2}x faster than {}",
            metric.candidate, ratio, metric.baseline
        ),
        Some(ratio) if ratio > 0.0 => format!(
            "{} is {:.2}x slower than {}",
            metric.candidate,
            1.0 / ratio,
            metric.baseline
        ),
        _ => format!(
            "speed of {} relative to {}: not applicable",
            metric.candidate, metric.baseline
        ),
    }
}

/// "Y uses P.P% less/more memory than X" for a comparison.
///
/// The direction comes from the two signed deltas; the percentage is shown
/// as a magnitude.
pub fn memory_phrase(metric: &ComparisonMetric) -> String {
    match (metric.memory_delta_percent, metric.memory_order()) {
        (Some(percent), Ordering::Less) => format!(
            "{} uses {:.1}% less memory than {}",
            metric.candidate,
            percent.abs(),
            metric.baseline
        ),
        (Some(percent), Ordering::Greater) => format!(
            "{} uses {:.1}% more memory than {}",
            metric.candidate,
            percent.abs(),
            metric.baseline
        ),
        (Some(_), Ordering::Equal) => format!(
            "{} uses the same memory as {}",
            metric.candidate, metric.baseline
        ),
        (None, _) => format!(
            "memory of {} relative to {}: not applicable",
            metric.candidate, metric.baseline
        ),
    }
}

/// Format milliseconds, switching to seconds from one second up.
pub fn format_duration_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.2} ms", ms)
    }
}

/// Format a signed byte count with binary units.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let sign = if bytes < 0 { "-" } else { "+" };
    let mut value = bytes.unsigned_abs() as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{} {}", sign, value, UNITS[unit])
    } else {
        format!("{}{:.2} {}", sign, value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use compbench_core::RunFailure;
    use std::time::Duration;

    /// A metric with a baseline memory delta of 1000 bytes.
    fn metric(speed: Option<f64>, memory: Option<f64>) -> ComparisonMetric {
        let candidate = memory.map_or(4096, |percent| (1000.0 - percent * 10.0) as i64);
        ComparisonMetric {
            baseline: "tsc".to_string(),
            candidate: "swc".to_string(),
            speed_ratio: speed,
            memory_delta_percent: memory,
            baseline_memory_delta: 1000,
            candidate_memory_delta: candidate,
        }
    }

    #[test]
    fn test_speed_phrase() {
        assert_eq!(
            speed_phrase(&metric(Some(5.0), None)),
            "swc is 5.00x faster than tsc"
        );
        assert_eq!(
            speed_phrase(&metric(Some(0.25), None)),
            "swc is 4.00x slower than tsc"
        );
        assert!(speed_phrase(&metric(None, None)).contains("not applicable"));
    }

    #[test]
    fn test_equal_speed_is_neutral() {
        assert_eq!(
            speed_phrase(&metric(Some(1.0), None)),
            "swc is as fast as tsc"
        );
        assert_eq!(
            speed_phrase(&metric(Some(0.999), None)),
            "swc is as fast as tsc"
        );
        assert_eq!(
            speed_phrase(&metric(Some(1.01), None)),
            "swc is 1.01x faster than tsc"
        );
    }

    #[test]
    fn test_memory_phrase() {
        assert_eq!(
            memory_phrase(&metric(None, Some(50.0))),
            "swc uses 50.0% less memory than tsc"
        );
        assert_eq!(
            memory_phrase(&metric(None, Some(-12.5))),
            "swc uses 12.5% more memory than tsc"
        );
        assert!(memory_phrase(&metric(None, None)).contains("not applicable"));
    }

    #[test]
    fn test_memory_direction_with_shrinking_baseline() {
        let records = vec![
            MeasurementRecord::success("tsc", Duration::from_millis(10), 2_000, 1_000),
            MeasurementRecord::success("swc", Duration::from_millis(10), 1_000, 2_000),
        ];
        let summary = aggregate(1, &records);

        let text = render_text(&summary, &records);

        assert!(text.contains("swc uses 200.0% more memory than tsc"), "{}", text);
        assert!(!text.contains("less memory"));
    }

    #[test]
    fn test_memory_direction_with_both_negative() {
        let mut shrinking = metric(None, None);
        shrinking.baseline_memory_delta = -1000;
        shrinking.candidate_memory_delta = -3000;
        // (-1000 - -3000) / -1000 * 100
        shrinking.memory_delta_percent = Some(-200.0);

        assert_eq!(
            memory_phrase(&shrinking),
            "swc uses 200.0% less memory than tsc"
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "+512 B");
        assert_eq!(format_bytes(-2048), "-2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "+3.00 MiB");
        assert_eq!(format_bytes(0), "+0 B");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(12.346), "12.35 ms");
        assert_eq!(format_duration_ms(1500.0), "1.50 s");
    }

    #[test]
    fn test_render_lists_records_then_comparisons() {
        let records = vec![
            MeasurementRecord::success("tsc", Duration::from_millis(500), 0, 1_000_000),
            MeasurementRecord::success("swc", Duration::from_millis(100), 0, 500_000),
            MeasurementRecord::failure(
                "ghost",
                Duration::from_millis(1),
                0,
                0,
                RunFailure::Launch {
                    message: "not found".to_string(),
                },
            ),
        ];
        let summary = aggregate(3, &records);

        let rendered = render(&summary, &records, Uuid::nil(), Utc::now());
        let lines: Vec<&str> = rendered.text.lines().collect();

        assert_eq!(lines[0], "Benchmark results (3 workload files)");
        assert!(lines[1].starts_with("  ✓ tsc: 500.00 ms"));
        assert!(lines[2].starts_with("  ✓ swc: 100.00 ms"));
        assert!(lines[3].starts_with("  ✗ ghost:"));
        assert!(lines[3].contains("failed to launch: not found"));
        assert_eq!(lines[4], "Comparisons");
        assert_eq!(lines[5], "  swc is 5.00x faster than tsc");
        assert_eq!(lines[6], "  swc uses 50.0% less memory than tsc");
        assert_eq!(rendered.document.results.len(), 3);
    }

    #[test]
    fn test_render_is_pure() {
        let records = vec![MeasurementRecord::success(
            "tsc",
            Duration::from_millis(5),
            0,
            0,
        )];
        let summary = aggregate(1, &records);
        let timestamp = Utc::now();

        assert_eq!(
            render(&summary, &records, Uuid::nil(), timestamp),
            render(&summary, &records, Uuid::nil(), timestamp)
        );
    }
}
