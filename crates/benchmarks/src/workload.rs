//! Synthetic workload generation.
//!
//! The generator writes `count` independent source files into a directory.
//! Writes run concurrently on the tokio blocking pool; the returned artifacts
//! are always in index order. A failed write rolls back every artifact the
//! same call already created.

use compbench_core::{
    CleanupFailure, HarnessConfig, HarnessError, Result, WorkloadArtifact, WorkloadSize,
};
use futures::stream::{self, StreamExt};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Writes synthetic input artifacts for the targets under test.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    dir: PathBuf,
    prefix: String,
    extension: String,
    size: WorkloadSize,
    parallelism: usize,
}

impl WorkloadGenerator {
    /// Create a generator writing into `dir` with default naming.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "module".to_string(),
            extension: "ts".to_string(),
            size: WorkloadSize::Small,
            parallelism: 4,
        }
    }

    /// Create a generator from the harness configuration.
    pub fn from_config(config: &HarnessConfig, dir: impl Into<PathBuf>) -> Self {
        Self::new(dir)
            .with_prefix(config.file_prefix.clone())
            .with_extension(config.file_extension.clone())
            .with_size(config.workload_size)
            .with_parallelism(config.parallelism)
    }

    /// Set the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the size class of each artifact.
    pub fn with_size(mut self, size: WorkloadSize) -> Self {
        self.size = size;
        self
    }

    /// Set the maximum number of concurrent writes.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Directory the artifacts are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the artifact with the given index.
    pub fn artifact_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_{:04}.{}", self.prefix, index, self.extension))
    }

    /// Generate `count` artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidArgument`] for a zero count, before
    /// touching storage. Returns [`HarnessError::Io`] if any write fails,
    /// after deleting the artifacts this call already created.
    pub async fn generate(&self, count: usize) -> Result<Vec<WorkloadArtifact>> {
        if count == 0 {
            return Err(HarnessError::invalid_argument(
                "workload count must be at least 1",
            ));
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            HarnessError::io(
                format!("creating workload directory {}", self.dir.display()),
                e,
            )
        })?;

        debug!(
            dir = %self.dir.display(),
            count,
            size = %self.size,
            parallelism = self.parallelism,
            "Generating workload"
        );

        let outcomes: Vec<std::result::Result<WorkloadArtifact, FailedWrite>> =
            stream::iter(0..count)
                .map(|index| self.write_artifact(index))
                .buffer_unordered(self.parallelism)
                .collect()
                .await;

        let mut created = Vec::with_capacity(count);
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(artifact) => created.push(artifact),
                Err(failure) => failed.push(failure),
            }
        }

        if !failed.is_empty() {
            failed.sort_by_key(|failure| failure.artifact.index);
            warn!(
                failed = failed.len(),
                created = created.len(),
                "Workload generation failed, rolling back"
            );

            // Files opened before the write failed are partial; paths that
            // could not be opened were never ours.
            let partial: Vec<WorkloadArtifact> = failed
                .iter()
                .filter(|failure| failure.opened)
                .map(|failure| failure.artifact.clone())
                .collect();
            created.extend(partial);
            let leftovers = remove_artifacts(&created).await;
            for leftover in &leftovers {
                warn!(
                    path = %leftover.path.display(),
                    error = %leftover.message,
                    "Rollback could not delete artifact"
                );
            }

            let first = failed.swap_remove(0);
            return Err(HarnessError::io(
                format!("writing workload artifact {}", first.artifact.path.display()),
                first.source,
            ));
        }

        created.sort_by_key(|artifact| artifact.index);
        info!(dir = %self.dir.display(), count = created.len(), "Workload generated");
        Ok(created)
    }

    async fn write_artifact(
        &self,
        index: usize,
    ) -> std::result::Result<WorkloadArtifact, FailedWrite> {
        let artifact = WorkloadArtifact::new(index, self.artifact_path(index));
        let contents = render_module(index, self.size);

        let mut file = match tokio::fs::File::create(&artifact.path).await {
            Ok(file) => file,
            Err(source) => {
                return Err(FailedWrite {
                    artifact,
                    source,
                    opened: false,
                })
            }
        };

        let written = async {
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await
        }
        .await;

        match written {
            Ok(()) => Ok(artifact),
            Err(source) => Err(FailedWrite {
                artifact,
                source,
                opened: true,
            }),
        }
    }
}

/// An artifact write that did not complete.
struct FailedWrite {
    artifact: WorkloadArtifact,
    source: io::Error,
    /// Whether the file was opened, and so may exist partially written.
    opened: bool,
}

/// Delete the given artifacts, best-effort.
///
/// Every artifact is attempted even if earlier deletions fail. Artifacts that
/// are already gone count as deleted.
pub async fn remove_artifacts(artifacts: &[WorkloadArtifact]) -> Vec<CleanupFailure> {
    let mut failures = Vec::new();
    for artifact in artifacts {
        match tokio::fs::remove_file(&artifact.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %artifact.path.display(), "Artifact already removed");
            }
            Err(e) => failures.push(CleanupFailure {
                path: artifact.path.clone(),
                message: e.to_string(),
            }),
        }
    }
    failures
}

/// Render the synthetic module for one artifact.
///
/// The content only has to be valid-looking input with a size proportional
/// to the size class; targets treat it as an opaque compile workload.
pub fn render_module(index: usize, size: WorkloadSize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated workload module {index}");
    let _ = writeln!(out);
    for block in 0..size.blocks() {
        let _ = write!(
            out,
            r#"export interface Entity{index}x{block} {{
  id: number;
  name: string;
  tags: ReadonlyArray<string>;
  parent?: Entity{index}x{block};
}}

export class Repository{index}x{block}<T extends Entity{index}x{block}> {{
  private readonly items = new Map<number, T>();

  add(item: T): void {{
    this.items.set(item.id, item);
  }}

  find(predicate: (item: T) => boolean): T[] {{
    return [...this.items.values()].filter(predicate);
  }}

  depth(item: T): number {{
    let depth = 0;
    for (let cur: Entity{index}x{block} | undefined = item; cur?.parent; cur = cur.parent) {{
      depth += 1;
    }}
    return depth;
  }}
}}

export function summarize{index}x{block}(items: Entity{index}x{block}[]): Record<string, number> {{
  return items.reduce<Record<string, number>>((acc, item) => {{
    for (const tag of item.tags) {{
      acc[tag] = (acc[tag] ?? 0) + item.id * {factor};
    }}
    return acc;
  }}, {{}});
}}

"#,
            factor = index + block + 1,
        );
    }
    out
}
