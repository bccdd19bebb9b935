//! Process memory sampling.
//!
//! The runner takes one sample immediately before launching a target and one
//! immediately after it exits. [`HostMemorySampler`] reads the resident set
//! size of the harness process itself, so the delta reflects what the host
//! accumulated around the child run, not the child's own footprint.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::warn;

/// Source of memory usage samples, in bytes.
#[cfg_attr(test, mockall::automock)]
pub trait MemorySampler {
    /// Take one sample.
    fn sample(&mut self) -> u64;
}

/// Samples the resident set size of the current process.
pub struct HostMemorySampler {
    system: System,
    pid: Option<Pid>,
}

impl HostMemorySampler {
    /// Create a sampler for the current process.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = e, "Cannot determine current pid, memory samples will be 0");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for HostMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for HostMemorySampler {
    fn sample(&mut self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system.process(pid).map_or(0, |p| p.memory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_sampler_reports_resident_memory() {
        let mut sampler = HostMemorySampler::new();
        assert!(sampler.sample() > 0);
    }

    #[test]
    fn test_host_sampler_sees_growth() {
        let mut sampler = HostMemorySampler::new();
        let before = sampler.sample();
        let ballast = vec![1u8; 64 * 1024 * 1024];
        std::hint::black_box(&ballast);
        let after = sampler.sample();
        assert!(after > before);
    }
}
