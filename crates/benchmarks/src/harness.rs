//! Harness orchestration.
//!
//! A run moves through
//!
//! ```text
//! Idle -> GeneratingWorkload -> RunningTargets -> Aggregating -> Emitting -> CleaningUp -> Done
//! ```
//!
//! and ends in `Failed` instead of `Done` when the request is invalid, the
//! workload cannot be generated, or the report cannot be persisted. Every
//! path passes through `CleaningUp`, which deletes all generated artifacts.
//! A failing target is not a harness failure: it becomes a failed record.

use crate::aggregate::aggregate;
use crate::io;
use crate::memory::{HostMemorySampler, MemorySampler};
use crate::report::{render, RenderedReport};
use crate::runner::TargetRunner;
use crate::workload::{remove_artifacts, WorkloadGenerator};
use chrono::Utc;
use compbench_core::{
    BenchmarkSummary, CleanupFailure, HarnessConfig, MeasurementRecord, Result, WorkloadArtifact,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessState {
    /// Nothing has happened yet.
    Idle,
    /// Writing workload artifacts.
    GeneratingWorkload,
    /// Running targets one after another.
    RunningTargets,
    /// Building the summary.
    Aggregating,
    /// Rendering and persisting the report.
    Emitting,
    /// Deleting workload artifacts.
    CleaningUp,
    /// Finished; the report was written.
    Done,
    /// Finished with a fatal error.
    Failed,
}

impl HarnessState {
    /// Whether the machine stops in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` may follow this state.
    pub fn can_transition_to(&self, next: HarnessState) -> bool {
        use HarnessState::*;

        match (self, next) {
            (Idle, GeneratingWorkload)
            | (GeneratingWorkload, RunningTargets)
            | (RunningTargets, Aggregating)
            | (Aggregating, Emitting)
            | (Emitting, CleaningUp)
            | (CleaningUp, Done) => true,
            (from, CleaningUp) => !from.is_terminal(),
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for HarnessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::GeneratingWorkload => "generating_workload",
            Self::RunningTargets => "running_targets",
            Self::Aggregating => "aggregating",
            Self::Emitting => "emitting",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Visited states of one run.
#[derive(Debug, Clone)]
struct StateTrail {
    run_id: Uuid,
    states: Vec<HarnessState>,
}

impl StateTrail {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            states: vec![HarnessState::Idle],
        }
    }

    fn current(&self) -> HarnessState {
        self.states[self.states.len() - 1]
    }

    fn enter(&mut self, next: HarnessState) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(next),
            "illegal harness transition {} -> {}",
            from,
            next
        );
        debug!(run_id = %self.run_id, from = %from, to = %next, "Harness state change");
        self.states.push(next);
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct HarnessOutcome {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// One record per target, in input order.
    pub records: Vec<MeasurementRecord>,
    /// Aggregated summary.
    pub summary: BenchmarkSummary,
    /// Rendered report.
    pub report: RenderedReport,
    /// Artifacts that were generated (and deleted again during cleanup).
    pub artifacts: Vec<WorkloadArtifact>,
    /// Artifacts that could not be deleted.
    pub cleanup_failures: Vec<CleanupFailure>,
    /// Visited states, starting with `Idle` and ending with `Done`.
    pub states: Vec<HarnessState>,
    /// Location of the JSON report.
    pub report_path: PathBuf,
    /// Location of the markdown summary, when one was written.
    pub markdown_path: Option<PathBuf>,
}

impl HarnessOutcome {
    /// Whether every target succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(MeasurementRecord::is_success)
    }
}

/// Sequences workload generation, target runs, aggregation, reporting and
/// cleanup for one benchmark run.
pub struct Harness<S = HostMemorySampler> {
    config: HarnessConfig,
    sampler: S,
}

impl Harness<HostMemorySampler> {
    /// Create a harness measuring the host process's memory.
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_sampler(config, HostMemorySampler::new())
    }
}

impl<S: MemorySampler> Harness<S> {
    /// Create a harness with a custom memory sampler.
    pub fn with_sampler(config: HarnessConfig, sampler: S) -> Self {
        Self { config, sampler }
    }

    /// Effective configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Execute the run.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidArgument`] for an invalid configuration
    /// and [`HarnessError::Io`] when the workload cannot be generated or the
    /// report cannot be written. Target failures are never errors.
    ///
    /// [`HarnessError::InvalidArgument`]: compbench_core::HarnessError::InvalidArgument
    /// [`HarnessError::Io`]: compbench_core::HarnessError::Io
    pub async fn run(self) -> Result<HarnessOutcome> {
        let Self { config, sampler } = self;
        let run_id = Uuid::new_v4();
        let mut trail = StateTrail::new(run_id);

        if let Err(e) = config.validate() {
            warn!(run_id = %run_id, error = %e, "Rejecting harness request");
            trail.enter(HarnessState::CleaningUp);
            trail.enter(HarnessState::Failed);
            return Err(e);
        }

        let run_dir = config.work_dir.join(format!("run-{}", run_id));
        info!(
            run_id = %run_id,
            targets = config.targets.len(),
            workload_count = config.workload_count,
            dir = %run_dir.display(),
            "Starting benchmark run"
        );

        trail.enter(HarnessState::GeneratingWorkload);
        let generator = WorkloadGenerator::from_config(&config, &run_dir);
        let artifacts = match generator.generate(config.workload_count).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Workload generation failed");
                trail.enter(HarnessState::CleaningUp);
                remove_run_dir(&run_dir).await;
                trail.enter(HarnessState::Failed);
                return Err(e);
            }
        };

        trail.enter(HarnessState::RunningTargets);
        let mut runner = TargetRunner::with_sampler(sampler).with_timeout(config.target_timeout);
        let mut records = Vec::with_capacity(config.targets.len());
        for target in &config.targets {
            records.push(runner.run(target, &artifacts).await);
        }

        trail.enter(HarnessState::Aggregating);
        assert_eq!(
            records.len(),
            config.targets.len(),
            "one measurement record per target"
        );
        let summary = aggregate(artifacts.len(), &records);

        trail.enter(HarnessState::Emitting);
        let report = render(&summary, &records, run_id, Utc::now());
        let markdown_path = config
            .markdown_summary
            .then(|| io::markdown_path_for(&config.output_path));
        let emitted = persist(&report, &config.output_path, markdown_path.as_deref()).await;

        trail.enter(HarnessState::CleaningUp);
        let cleanup_failures = remove_artifacts(&artifacts).await;
        for failure in &cleanup_failures {
            warn!(
                run_id = %run_id,
                path = %failure.path.display(),
                error = %failure.message,
                "Could not delete workload artifact"
            );
        }
        remove_run_dir(&run_dir).await;

        if let Err(e) = emitted {
            trail.enter(HarnessState::Failed);
            return Err(e);
        }

        trail.enter(HarnessState::Done);
        info!(
            run_id = %run_id,
            succeeded = summary.success_count(),
            failed = records.len() - summary.success_count(),
            report = %config.output_path.display(),
            "Benchmark run complete"
        );

        Ok(HarnessOutcome {
            run_id,
            records,
            summary,
            report,
            artifacts,
            cleanup_failures,
            states: trail.states,
            report_path: config.output_path,
            markdown_path,
        })
    }
}

async fn persist(
    report: &RenderedReport,
    report_path: &Path,
    markdown_path: Option<&Path>,
) -> Result<()> {
    io::write_report_json(&report.document, report_path).await?;
    if let Some(path) = markdown_path {
        io::write_summary(&report.document, path).await?;
    }
    Ok(())
}

/// Remove the per-run directory if it is empty. Leftovers stay for inspection.
async fn remove_run_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(dir = %dir.display(), error = %e, "Workload directory left in place");
        }
    }
}
