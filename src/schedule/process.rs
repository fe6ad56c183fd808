use std::process::{Child, Command};

use tracing::{debug, warn};

use crate::foundation::error::{SpherecastError, SpherecastResult};

/// The process-per-job fallback: no queue, no worker set. Every spawned
/// command becomes an independent OS process immediately; `wait_all` reaps
/// them. Trades queue discipline for isolation — a crashing job cannot
/// take the parent (or any sibling frame) down with it.
#[derive(Debug, Default)]
pub struct ProcessPool {
    children: Vec<Child>,
}

/// Exit accounting for one batch of child processes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub spawned: usize,
    pub failed: usize,
}

impl ProcessPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }

    /// Launches `cmd` as an independent child process. Spawn errors are
    /// propagated; the caller decides whether a failed spawn aborts the
    /// batch or just drops that job.
    pub fn spawn(&mut self, mut cmd: Command) -> SpherecastResult<()> {
        let child = cmd.spawn().map_err(|e| {
            SpherecastError::schedule(format!(
                "failed to spawn worker process {:?}: {e}",
                cmd.get_program()
            ))
        })?;
        debug!(pid = child.id(), "spawned worker process");
        self.children.push(child);
        Ok(())
    }

    /// Blocks until every spawned child has exited. Children that exit
    /// non-zero (or cannot be waited on) count as failed; they never abort
    /// the rest of the batch.
    pub fn wait_all(&mut self) -> ProcessReport {
        let mut report = ProcessReport::default();
        for mut child in self.children.drain(..) {
            report.spawned += 1;
            match child.wait() {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    warn!(pid = child.id(), %status, "worker process failed");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(pid = child.id(), error = %e, "could not wait on worker process");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl Drop for ProcessPool {
    fn drop(&mut self) {
        if !self.children.is_empty() {
            // Never leave zombies behind when the pool is dropped mid-batch.
            self.wait_all();
        }
    }
}
