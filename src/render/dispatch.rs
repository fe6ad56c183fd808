use std::{
    path::PathBuf,
    process::{Command, Stdio},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{
    encode::ppm,
    foundation::{
        core::{FrameIndex, RenderSettings},
        error::{SpherecastError, SpherecastResult},
    },
    render::pipeline::render_frame,
    scene::model::Sphere,
    schedule::{pool::WorkerPool, process::ProcessPool},
};

/// One frame's worth of work: a value-copied sphere snapshot plus where the
/// encoded image goes. Serializable so the process backend can hand it to a
/// worker process unchanged.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameJob {
    pub frame: FrameIndex,
    pub spheres: Vec<Sphere>,
    pub settings: RenderSettings,
    pub out_path: PathBuf,
}

/// Renders the job's snapshot and encodes it to its output path. Both
/// scheduler backends execute exactly this, in-process or in a worker.
pub fn run_frame_job(job: &FrameJob) -> SpherecastResult<()> {
    let frame = render_frame(&job.spheres, &job.settings)?;
    ppm::write_ppm(&job.out_path, &frame)?;
    debug!(frame = job.frame.0, path = %job.out_path.display(), "frame encoded");
    Ok(())
}

/// Completion accounting for one batch: `completed + failed` equals the
/// number of submitted jobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: u64,
    pub failed: u64,
}

/// The frame-level scheduling contract shared by both concurrency backends.
///
/// Jobs may finish in any order; each one owns its snapshot and writes its
/// own output artifact, so out-of-order completion is harmless. A failing
/// job is logged and counted, and never prevents the rest of the batch.
pub trait FrameScheduler {
    /// Hands one frame job to the backend. Never blocks on job execution.
    fn submit(&mut self, job: FrameJob) -> SpherecastResult<()>;

    /// Blocks until every job submitted before this call has finished, and
    /// resets the batch accounting.
    fn wait_all(&mut self) -> SpherecastResult<BatchReport>;
}

/// Which concurrency backend to run a batch on. Chosen once at
/// construction; never mixed within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Shared in-process worker pool.
    Pool,
    /// One independent OS process per frame.
    Process,
}

#[derive(Clone, Debug, Default)]
pub struct SchedulerOpts {
    /// Worker threads for the pool backend. Defaults to the machine's
    /// available parallelism.
    pub workers: Option<usize>,
    /// Executable the process backend spawns per frame. Defaults to the
    /// current executable; it must understand `worker --job <file>`.
    pub worker_exe: Option<PathBuf>,
}

pub fn create_scheduler(
    kind: SchedulerKind,
    opts: &SchedulerOpts,
) -> SpherecastResult<Box<dyn FrameScheduler>> {
    match kind {
        SchedulerKind::Pool => Ok(Box::new(PoolScheduler::new(opts.workers)?)),
        SchedulerKind::Process => Ok(Box::new(ProcessScheduler::new(opts.worker_exe.clone())?)),
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Frame scheduling over the shared [`WorkerPool`]. Each submitted job is
/// wrapped so render/encode errors are logged and counted without ever
/// disturbing the pool's completion bookkeeping.
pub struct PoolScheduler {
    pool: WorkerPool,
    submitted: u64,
    failed: Arc<AtomicU64>,
}

impl PoolScheduler {
    pub fn new(workers: Option<usize>) -> SpherecastResult<Self> {
        let threads = workers.unwrap_or_else(default_parallelism);
        Ok(Self {
            pool: WorkerPool::new(threads)?,
            submitted: 0,
            failed: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}

impl FrameScheduler for PoolScheduler {
    fn submit(&mut self, job: FrameJob) -> SpherecastResult<()> {
        let failed = Arc::clone(&self.failed);
        self.submitted += 1;
        self.pool.submit(move || {
            if let Err(e) = run_frame_job(&job) {
                warn!(frame = job.frame.0, error = %e, "frame job failed");
                failed.fetch_add(1, Ordering::SeqCst);
            }
        });
        Ok(())
    }

    fn wait_all(&mut self) -> SpherecastResult<BatchReport> {
        self.pool.wait_all();
        let failed = self.failed.swap(0, Ordering::SeqCst);
        let submitted = std::mem::take(&mut self.submitted);
        Ok(BatchReport {
            completed: submitted - failed,
            failed,
        })
    }
}

/// Deletes the job file when the batch is done with it.
struct JobFileGuard(PathBuf);

impl Drop for JobFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Frame scheduling by spawning one worker process per job. The snapshot
/// travels as a JSON job file consumed by the worker executable's hidden
/// `worker` subcommand.
///
/// A job whose file cannot be written or whose process fails to spawn is
/// dropped with a warning — that frame is simply missing from the output
/// sequence; the batch continues.
pub struct ProcessScheduler {
    procs: ProcessPool,
    worker_exe: PathBuf,
    job_files: Vec<JobFileGuard>,
    dropped: u64,
}

impl ProcessScheduler {
    pub fn new(worker_exe: Option<PathBuf>) -> SpherecastResult<Self> {
        let worker_exe = match worker_exe {
            Some(path) => path,
            None => std::env::current_exe().map_err(|e| {
                SpherecastError::schedule(format!("cannot locate worker executable: {e}"))
            })?,
        };
        Ok(Self {
            procs: ProcessPool::new(),
            worker_exe,
            job_files: Vec::new(),
            dropped: 0,
        })
    }

    fn write_job_file(job: &FrameJob) -> SpherecastResult<PathBuf> {
        let path = std::env::temp_dir().join(format!(
            "spherecast_job_{}_{}.json",
            std::process::id(),
            job.frame.0
        ));
        let json = serde_json::to_vec(job).map_err(|e| {
            SpherecastError::schedule(format!("failed to serialize frame job: {e}"))
        })?;
        std::fs::write(&path, json).map_err(|e| {
            SpherecastError::schedule(format!(
                "failed to write job file '{}': {e}",
                path.display()
            ))
        })?;
        Ok(path)
    }
}

impl FrameScheduler for ProcessScheduler {
    fn submit(&mut self, job: FrameJob) -> SpherecastResult<()> {
        let job_file = match Self::write_job_file(&job) {
            Ok(path) => JobFileGuard(path),
            Err(e) => {
                warn!(frame = job.frame.0, error = %e, "dropping frame: job file not written");
                self.dropped += 1;
                return Ok(());
            }
        };

        let mut cmd = Command::new(&self.worker_exe);
        cmd.arg("worker")
            .arg("--job")
            .arg(&job_file.0)
            .stdin(Stdio::null())
            .stdout(Stdio::null());

        if let Err(e) = self.procs.spawn(cmd) {
            warn!(frame = job.frame.0, error = %e, "dropping frame: worker did not spawn");
            self.dropped += 1;
            return Ok(());
        }
        self.job_files.push(job_file);
        Ok(())
    }

    fn wait_all(&mut self) -> SpherecastResult<BatchReport> {
        let report = self.procs.wait_all();
        self.job_files.clear();
        let dropped = std::mem::take(&mut self.dropped);
        Ok(BatchReport {
            completed: (report.spawned - report.failed) as u64,
            failed: report.failed as u64 + dropped,
        })
    }
}
