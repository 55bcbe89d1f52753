//! Elastic worker pool with no long-lived idle threads.
//!
//! Threads are spawned as jobs arrive (up to `max_workers`), keep draining
//! the shared queue while it has work, and exit as soon as it is empty. A
//! quiet pool therefore holds zero threads.
//!
//! One mutex guards both the queue and the active-worker count. It is held
//! only for pushes, pops and counter updates, never while a job runs.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

/// A unit of work. Errors are logged by the pool and otherwise ignored.
pub type Job = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

const WORKER_THREAD_NAME: &str = "tubeforge-worker";

struct PoolState {
    jobs: VecDeque<Job>,
    active: usize,
}

struct PoolShared {
    max_workers: usize,
    state: Mutex<PoolState>,
    idle: Condvar,
}

/// Cloneable handle to a bounded, self-shrinking thread pool.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Create a pool that runs at most `max_workers` jobs at once.
    ///
    /// A value of zero is treated as one.
    pub fn new(max_workers: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                max_workers: max_workers.max(1),
                state: Mutex::new(PoolState {
                    jobs: VecDeque::new(),
                    active: 0,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.shared.max_workers
    }

    /// Number of worker threads currently alive.
    pub fn active_workers(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Queue `job`, starting a new worker if the pool is below its limit.
    ///
    /// Safe to call from inside another job.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let spawn = {
            let mut state = self.shared.state.lock();
            state.jobs.push_back(Box::new(job));
            if state.active < self.shared.max_workers {
                state.active += 1;
                true
            } else {
                false
            }
        };

        if spawn {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(WORKER_THREAD_NAME.into())
                .spawn(move || worker_loop(&shared));

            if let Err(e) = spawned {
                error!(error = %e, "Failed to spawn worker thread, draining queue inline");
                self.run_inline();
            }
        }
    }

    /// Drain the queue on the calling thread, using the worker slot the
    /// caller already counted in `active`.
    fn run_inline(&self) {
        worker_loop(&self.shared);
    }

    /// Block until the queue is empty and every worker has exited, or until
    /// `timeout` elapses. Returns `true` if the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.active > 0 || !state.jobs.is_empty() {
            if self
                .shared
                .idle
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.active == 0 && state.jobs.is_empty();
            }
        }
        true
    }
}

fn worker_loop(shared: &PoolShared) {
    debug!("Worker started");
    loop {
        let job = {
            let mut state = shared.state.lock();
            match state.jobs.pop_front() {
                Some(job) => job,
                None => {
                    state.active -= 1;
                    if state.active == 0 {
                        shared.idle.notify_all();
                    }
                    break;
                }
            }
        };

        run_job(job);
    }
    debug!("Worker exiting, queue drained");
}

/// Run one job, logging its error or panic instead of propagating it.
fn run_job(job: Job) {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(error = ?e, "Worker job failed");
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(panic = %message, "Worker job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn runs_every_job_and_goes_idle() {
        let pool = WorkerPool::new(4);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..40 {
            let done = Arc::clone(&done);
            pool.submit(move || {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert!(pool.wait_idle(WAIT));
        assert_eq!(done.load(Ordering::SeqCst), 40);
        assert_eq!(pool.active_workers(), 0);
    }

    #[test]
    fn spawns_one_worker_per_job_below_limit() {
        let pool = WorkerPool::new(15);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(std::sync::Mutex::new(release_rx));
        let started = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let release_rx = Arc::clone(&release_rx);
            let started = Arc::clone(&started);
            pool.submit(move || {
                started.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx.lock().unwrap().recv();
                Ok(())
            });
        }

        assert_eq!(pool.active_workers(), 5);

        for _ in 0..5 {
            release_tx.send(()).unwrap();
        }
        assert!(pool.wait_idle(WAIT));
        assert_eq!(started.load(Ordering::SeqCst), 5);
        assert_eq!(pool.active_workers(), 0);
    }

    #[test]
    fn burst_never_exceeds_limit() {
        let max = 15;
        let pool = WorkerPool::new(max);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..(max + 10) {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.submit(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
            assert!(pool.active_workers() <= max);
        }

        assert!(pool.wait_idle(WAIT));
        assert!(peak.load(Ordering::SeqCst) <= max);
        assert_eq!(pool.active_workers(), 0);
    }

    #[test]
    fn failing_and_panicking_jobs_do_not_stop_the_pool() {
        let pool = WorkerPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        pool.submit(|| anyhow::bail!("remote exploded"));
        pool.submit(|| panic!("job bug"));
        for _ in 0..3 {
            let done = Arc::clone(&done);
            pool.submit(move || {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert!(pool.wait_idle(WAIT));
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn jobs_may_submit_more_jobs() {
        let pool = WorkerPool::new(2);
        let done = Arc::new(AtomicUsize::new(0));

        let inner_pool = pool.clone();
        let inner_done = Arc::clone(&done);
        pool.submit(move || {
            for _ in 0..3 {
                let done = Arc::clone(&inner_done);
                inner_pool.submit(move || {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

        assert!(pool.wait_idle(WAIT));
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn restarts_after_draining() {
        let pool = WorkerPool::new(3);
        pool.submit(|| Ok(()));
        assert!(pool.wait_idle(WAIT));
        assert_eq!(pool.active_workers(), 0);

        let (tx, rx) = mpsc::channel();
        pool.submit(move || {
            tx.send(42).unwrap();
            Ok(())
        });
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 42);
        assert!(pool.wait_idle(WAIT));
    }

    #[test]
    fn inline_drain_runs_queued_job_and_releases_slot() {
        let pool = WorkerPool::new(2);
        let (tx, rx) = mpsc::channel();
        {
            let mut state = pool.shared.state.lock();
            state.jobs.push_back(Box::new(move || {
                tx.send(thread::current().id()).unwrap();
                Ok(())
            }));
            state.active += 1;
        }

        pool.run_inline();

        assert_eq!(rx.try_recv().unwrap(), thread::current().id());
        assert_eq!(pool.active_workers(), 0);
        assert!(pool.wait_idle(WAIT));
    }

    #[test]
    fn zero_limit_still_runs_jobs() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.max_workers(), 1);
        let (tx, rx) = mpsc::channel();
        pool.submit(move || {
            tx.send(()).unwrap();
            Ok(())
        });
        assert!(rx.recv_timeout(WAIT).is_ok());
    }
}
