//! I/O operations for benchmark reports.
//!
//! This module provides functionality to write reports to the filesystem
//! and to read them back.

use crate::markdown;
use crate::result::BenchmarkReport;
use compbench_core::{HarnessError, Result};
use std::path::{Path, PathBuf};

/// Default location of the JSON report.
pub const DEFAULT_REPORT_FILE: &str = "benchmark-results.json";

/// Write `contents` to `path`, creating its parent directory if needed.
async fn write_file(path: &Path, contents: String) -> Result<()> {
    let result = async {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    };
    result
        .await
        .map_err(|e| HarnessError::io(format!("writing {}", path.display()), e))
}

/// Serialize the report as pretty-printed JSON.
pub fn to_json(report: &BenchmarkReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| HarnessError::serialization(e.to_string()))
}

/// Write the report as pretty-printed JSON.
pub async fn write_report_json(report: &BenchmarkReport, path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), to_json(report)?).await
}

/// Location of the markdown summary that accompanies a JSON report.
pub fn markdown_path_for(report_path: impl AsRef<Path>) -> PathBuf {
    report_path.as_ref().with_extension("md")
}

/// Write the markdown summary of the report.
pub async fn write_summary(report: &BenchmarkReport, path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), markdown::generate_summary(report)).await
}

/// Read a report from a JSON file.
pub async fn read_report_json(path: impl AsRef<Path>) -> Result<BenchmarkReport> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HarnessError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| {
        HarnessError::serialization(format!("{} is not a report: {}", path.display(), e))
    })
}
