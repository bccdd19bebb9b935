//! Target execution with resource sampling.
//!
//! # Sampling protocol
//!
//! 1. sample memory, then wall-clock time (T0)
//! 2. spawn the target with its declared arguments
//! 3. wait for the target process to exit, while stdout and stderr are
//!    drained by separate tasks
//! 4. sample wall-clock time (T1), then memory
//!
//! Memory is sampled outside the timed window so the sampler's own cost is not
//! charged to the target. T1 is taken as soon as the target exits, even if a
//! process it left behind still holds its output pipes; diagnostics are then
//! collected within [`OUTPUT_GRACE`]. Each call spawns exactly one child and
//! never retries.

use crate::memory::{HostMemorySampler, MemorySampler};
use compbench_core::{MeasurementRecord, RunFailure, TargetSpec, WorkloadArtifact};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on diagnostic output kept in an error description.
pub const MAX_DIAGNOSTIC_BYTES: usize = 4096;

/// Upper bound on output buffered per stream. Anything beyond is drained and
/// discarded so the target never blocks on a full pipe.
pub const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// How long captured output may keep arriving after the target exited.
pub const OUTPUT_GRACE: Duration = Duration::from_millis(200);

/// Runs targets one at a time and measures them.
pub struct TargetRunner<S = HostMemorySampler> {
    sampler: S,
    timeout: Option<Duration>,
}

impl TargetRunner<HostMemorySampler> {
    /// Create a runner sampling the harness process's memory.
    pub fn new() -> Self {
        Self::with_sampler(HostMemorySampler::new())
    }
}

impl Default for TargetRunner<HostMemorySampler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MemorySampler> TargetRunner<S> {
    /// Create a runner with a custom memory sampler.
    pub fn with_sampler(sampler: S) -> Self {
        Self {
            sampler,
            timeout: None,
        }
    }

    /// Kill targets that run longer than `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one target against a workload that is already on disk.
    ///
    /// The target finds the workload by its own convention; nothing about the
    /// artifacts is passed to it. Failures are returned as data on the record.
    pub async fn run(
        &mut self,
        target: &TargetSpec,
        workload: &[WorkloadArtifact],
    ) -> MeasurementRecord {
        let mut command = Command::new(target.command());
        command
            .args(target.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            target_name = %target.name(),
            command = %target,
            artifacts = workload.len(),
            "Launching target"
        );

        let memory_before = self.sampler.sample();
        let started = Instant::now();
        let exited = match command.spawn() {
            Ok(mut child) => {
                let drain = OutputDrain::start(&mut child);
                let status = self.wait(&mut child).await;
                Ok((status, drain))
            }
            Err(e) => Err(RunFailure::Launch {
                message: e.to_string(),
            }),
        };
        let duration = started.elapsed();
        let memory_after = self.sampler.sample();

        let outcome = match exited {
            Ok((Ok(status), mut drain)) => {
                let (stderr, stdout) = drain.finish().await;
                classify(status, &stderr, &stdout)
            }
            Ok((Err(failure), _)) | Err(failure) => Err(failure),
        };

        match outcome {
            Ok(()) => {
                info!(
                    target_name = %target.name(),
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    memory_before,
                    memory_after,
                    "Target succeeded"
                );
                MeasurementRecord::success(target.name(), duration, memory_before, memory_after)
            }
            Err(failure) => {
                warn!(
                    target_name = %target.name(),
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    error = %failure,
                    "Target failed"
                );
                MeasurementRecord::failure(
                    target.name(),
                    duration,
                    memory_before,
                    memory_after,
                    failure,
                )
            }
        }
    }

    /// Wait for the target process itself to exit.
    async fn wait(&self, child: &mut Child) -> Result<ExitStatus, RunFailure> {
        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    if let Err(e) = child.start_kill() {
                        debug!(error = %e, "Could not kill timed out target");
                    }
                    return Err(RunFailure::TimedOut { after: limit });
                }
            },
            None => child.wait().await,
        };

        status.map_err(|e| RunFailure::Launch {
            message: format!("lost track of the process: {}", e),
        })
    }
}

/// Background readers for a child's stdout and stderr.
///
/// Dropping the drain stops the readers, which closes the harness's end of
/// both pipes.
struct OutputDrain {
    stdout: Captured,
    stderr: Captured,
}

struct Captured {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: JoinHandle<()>,
}

impl OutputDrain {
    fn start(child: &mut Child) -> Self {
        Self {
            stdout: Captured::spawn(child.stdout.take()),
            stderr: Captured::spawn(child.stderr.take()),
        }
    }

    /// Wait up to [`OUTPUT_GRACE`] for both streams to close, then return
    /// what was captured as `(stderr, stdout)`.
    async fn finish(&mut self) -> (Vec<u8>, Vec<u8>) {
        let closed = tokio::time::timeout(OUTPUT_GRACE, async {
            let _ = (&mut self.stdout.reader).await;
            let _ = (&mut self.stderr.reader).await;
        })
        .await;
        if closed.is_err() {
            debug!("Target output still open after exit, keeping what arrived");
        }
        (self.stderr.take(), self.stdout.take())
    }
}

impl Drop for OutputDrain {
    fn drop(&mut self) {
        self.stdout.reader.abort();
        self.stderr.reader.abort();
    }
}

impl Captured {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut captured) = sink.lock() {
                            let room = MAX_CAPTURED_BYTES.saturating_sub(captured.len());
                            captured.extend_from_slice(&chunk[..n.min(room)]);
                        }
                    }
                }
            }
        });
        Self { buffer, reader }
    }

    fn take(&self) -> Vec<u8> {
        match self.buffer.lock() {
            Ok(mut captured) => std::mem::take(&mut *captured),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

/// Classify a finished process. Exit status 0 is the only success.
pub fn classify(status: ExitStatus, stderr: &[u8], stdout: &[u8]) -> Result<(), RunFailure> {
    if status.success() {
        return Ok(());
    }

    let diagnostics = collect_diagnostics(stderr, stdout);
    match status.code() {
        Some(code) => Err(RunFailure::NonZeroExit { code, diagnostics }),
        None => Err(signal_failure(status, diagnostics)),
    }
}

#[cfg(unix)]
fn signal_failure(status: ExitStatus, diagnostics: String) -> RunFailure {
    use std::os::unix::process::ExitStatusExt;

    RunFailure::Signaled {
        signal: status.signal().unwrap_or_default(),
        diagnostics,
    }
}

#[cfg(not(unix))]
fn signal_failure(_status: ExitStatus, diagnostics: String) -> RunFailure {
    RunFailure::NonZeroExit {
        code: -1,
        diagnostics,
    }
}

/// Pick the diagnostic stream: stderr, or stdout when stderr is empty.
///
/// Compilers disagree on where errors go, so whichever stream has content is
/// kept, trimmed and cut to [`MAX_DIAGNOSTIC_BYTES`] on a char boundary.
pub fn collect_diagnostics(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(stdout)
    } else {
        stderr
    };
    let text = text.trim();

    if text.len() <= MAX_DIAGNOSTIC_BYTES {
        return text.to_string();
    }
    let mut end = MAX_DIAGNOSTIC_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
