use std::{
    collections::VecDeque,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
};

use tracing::warn;

use crate::foundation::error::{SpherecastError, SpherecastResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    /// Pending jobs, executed FIFO.
    queue: VecDeque<Job>,
    /// Submitted-but-not-yet-finished jobs, queued and executing alike.
    /// Reaches zero exactly when every submitted job has completed.
    remaining: usize,
    stopping: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    /// A job was queued, or the pool is stopping.
    job_ready: Condvar,
    /// `remaining` crossed zero.
    all_done: Condvar,
}

impl Shared {
    // Jobs run outside the lock, so a poisoned mutex only ever means a
    // panic in the pool's own bookkeeping; the state is still coherent and
    // wedging every other worker over it helps nobody.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A fixed pool of worker threads over one shared FIFO job queue.
///
/// `submit` never blocks; `wait_all` blocks the caller until every job
/// submitted so far has finished executing. The completion count and its
/// zero-crossing signal live under the same mutex, so the last job
/// finishing can never slip between a caller's check and its wait.
///
/// Workers are joined exactly once, on drop. The pool may be reused for
/// further batches after a `wait_all`.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> SpherecastResult<Self> {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                remaining: 0,
                stopping: false,
            }),
            job_ready: Condvar::new(),
            all_done: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let worker_shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("spherecast-worker-{id}"))
                .spawn(move || worker_loop(id, &worker_shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Unwind the workers that did start before reporting.
                    shared.lock().stopping = true;
                    shared.job_ready.notify_all();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(SpherecastError::schedule(format!(
                        "failed to spawn worker thread {id}: {e}"
                    )));
                }
            }
        }

        Ok(Self { shared, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job for execution by some worker. Never blocks.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        let mut state = self.shared.lock();
        state.queue.push_back(Box::new(job));
        state.remaining += 1;
        drop(state);
        self.shared.job_ready.notify_one();
    }

    /// Blocks until every job submitted before this call has finished.
    /// Returns immediately when nothing is outstanding.
    pub fn wait_all(&self) {
        let mut state = self.shared.lock();
        while state.remaining > 0 {
            state = self
                .shared
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.lock().stopping = true;
        self.shared.job_ready.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("worker thread panicked outside a job");
            }
        }
    }
}

fn worker_loop(id: usize, shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                if state.stopping {
                    return;
                }
                state = shared
                    .job_ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        // Execute outside the lock. A panicking job must still be counted
        // as finished, or wait_all would hang forever.
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!(worker = id, "job panicked; completion is still recorded");
        }

        let mut state = shared.lock();
        state.remaining -= 1;
        if state.remaining == 0 {
            shared.all_done.notify_all();
        }
    }
}
