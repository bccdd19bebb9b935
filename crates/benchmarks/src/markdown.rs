//! Markdown output generation for benchmark reports.
//!
//! This module renders a [`BenchmarkReport`] as a markdown summary suitable
//! for pasting into a pull request or CI job summary.

use crate::report::{format_bytes, format_duration_ms};
use crate::result::BenchmarkReport;
use std::fmt::Write;

/// Generate a markdown summary from a report.
pub fn generate_summary(report: &BenchmarkReport) -> String {
    let mut output = String::new();
    let _ = write_summary(&mut output, report);
    output
}

fn write_summary(output: &mut String, report: &BenchmarkReport) -> std::fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;
    writeln!(output, "Generated: {}", report.timestamp.to_rfc3339())?;
    writeln!(output)?;
    writeln!(output, "Run: `{}`", report.run_id)?;
    writeln!(output)?;
    writeln!(output, "Workload files: {}", report.summary.test_files_count)?;
    writeln!(output)?;
    writeln!(output, "## Results")?;
    writeln!(output)?;
    writeln!(output, "| Target | Status | Time | Memory | Error |")?;
    writeln!(output, "|--------|--------|------|--------|-------|")?;

    for result in &report.results {
        writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            escape(&result.target),
            if result.success { "pass" } else { "fail" },
            format_duration_ms(result.execution_time),
            format_bytes(result.memory_usage),
            result.error_message.as_deref().map(escape).unwrap_or_default()
        )?;
    }

    if !report.comparisons.is_empty() {
        writeln!(output)?;
        writeln!(output, "## Comparisons")?;
        writeln!(output)?;
        writeln!(output, "| Baseline | Candidate | Speed ratio | Memory delta |")?;
        writeln!(output, "|----------|-----------|-------------|--------------|")?;
        for comparison in &report.comparisons {
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                escape(&comparison.baseline),
                escape(&comparison.candidate),
                comparison
                    .speed_ratio
                    .map(|r| format!("{:.2}x", r))
                    .unwrap_or_else(|| "n/a".to_string()),
                comparison
                    .memory_delta_percent
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "n/a".to_string()),
            )?;
        }
    }

    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(output, "Total targets: {}", report.results.len())?;
    Ok(())
}

/// Keep table cells on one line and pipes out of the cell separators.
fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use chrono::Utc;
    use compbench_core::{MeasurementRecord, RunFailure};
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_summary_has_result_and_comparison_tables() {
        let records = vec![
            MeasurementRecord::success("tsc", Duration::from_millis(500), 0, 1_000_000),
            MeasurementRecord::success("swc", Duration::from_millis(100), 0, 500_000),
        ];
        let summary = aggregate(10, &records);
        let report = BenchmarkReport::new(Uuid::nil(), Utc::now(), &summary, &records);

        let markdown = generate_summary(&report);

        assert!(markdown.starts_with("# Benchmark Summary"));
        assert!(markdown.contains("Workload files: 10"));
        assert!(markdown.contains("| tsc | pass | 500.00 ms |"));
        assert!(markdown.contains("| tsc | swc | 5.00x | 50.0% |"));
        assert!(markdown.contains("Total targets: 2"));
    }

    #[test]
    fn test_multiline_error_stays_in_cell() {
        let records = vec![MeasurementRecord::failure(
            "tsc",
            Duration::from_millis(5),
            0,
            0,
            RunFailure::NonZeroExit {
                code: 2,
                diagnostics: "a.ts(1,1): error\nb.ts | error".to_string(),
            },
        )];
        let summary = aggregate(1, &records);
        let report = BenchmarkReport::new(Uuid::nil(), Utc::now(), &summary, &records);

        let markdown = generate_summary(&report);

        assert!(markdown.contains("exited with code 2: a.ts(1,1): error b.ts \\| error |"));
        assert!(!markdown.contains("## Comparisons"));
    }
}
