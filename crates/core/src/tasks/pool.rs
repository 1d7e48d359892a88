//! Elastic worker pool
//!
//! Jobs go into an unbounded queue. A worker thread is started whenever
//! more jobs are queued than workers are idle, so a job never waits behind
//! a long running one. Workers exit after sitting idle for the configured
//! timeout.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// A job to execute on a worker thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// How long an idle worker waits for a job before exiting
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool no longer accepts jobs
    #[error("Worker pool is shut down")]
    ShutDown,

    /// The OS refused to start a worker thread
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// State shared between the pool handle and its workers
struct Shared {
    receiver: Receiver<Task>,
    /// Workers currently waiting for a job
    idle: AtomicUsize,
    idle_timeout: Duration,
}

/// Unbounded pool of worker threads
pub struct WorkerPool {
    shared: Arc<Shared>,
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicUsize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl WorkerPool {
    pub fn new(idle_timeout: Duration) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            shared: Arc::new(Shared {
                receiver,
                idle: AtomicUsize::new(0),
                idle_timeout,
            }),
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Queue a job
    ///
    /// This is safe to call from any thread.
    ///
    /// # Returns
    /// - `Ok(())` if the job was queued
    /// - `Err(PoolError::ShutDown)` after [`shutdown`](Self::shutdown)
    /// - `Err(PoolError::Spawn)` if no worker could be started; the job
    ///   stays queued for the next worker
    #[tracing::instrument(skip(self, task))]
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let sender = self.sender.lock();
            let sender = sender.as_ref().ok_or(PoolError::ShutDown)?;
            sender.send(Box::new(task)).map_err(|_| PoolError::ShutDown)?;
        }

        if self.shared.receiver.len() > self.shared.idle.load(Ordering::SeqCst) {
            self.spawn_worker()?;
        }
        Ok(())
    }

    fn spawn_worker(&self) -> Result<(), PoolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("chatroute-worker-{}", id))
            .spawn(move || worker_loop(shared))?;

        let mut workers = self.workers.lock();
        workers.retain(|worker| !worker.is_finished());
        workers.push(handle);
        tracing::trace!("Started worker {} ({} running)", id, workers.len());
        Ok(())
    }

    /// Number of live worker threads
    pub fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|worker| !worker.is_finished())
            .count()
    }

    /// Number of jobs waiting for a worker
    pub fn queued_count(&self) -> usize {
        self.shared.receiver.len()
    }

    /// Stop accepting jobs and wait for queued jobs to finish
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked during shutdown");
            }
        }
        tracing::debug!("Worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers drain the queue and exit once the sender is gone
        self.sender.lock().take();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        shared.idle.fetch_add(1, Ordering::SeqCst);
        let received = shared.receiver.recv_timeout(shared.idle_timeout);
        shared.idle.fetch_sub(1, Ordering::SeqCst);

        match received {
            Ok(task) => {
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!("Worker job panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                // A job queued while this worker was giving up is still ours
                if shared.receiver.is_empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use crossbeam_channel::bounded;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_submit_runs_task() {
        let pool = WorkerPool::default();
        let (tx, rx) = bounded(1);

        pool.submit(move || tx.send(42).unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(WAIT), Ok(42));
        pool.shutdown();
    }

    #[test]
    fn test_blocked_job_does_not_block_others() {
        let pool = WorkerPool::default();
        let barrier = Arc::new(Barrier::new(3));
        let (tx, rx) = bounded(2);

        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            let tx = tx.clone();
            pool.submit(move || {
                barrier.wait();
                tx.send(()).unwrap();
            })
            .unwrap();
        }

        // Both jobs must be running at once to pass the barrier
        barrier.wait();
        assert!(rx.recv_timeout(WAIT).is_ok());
        assert!(rx.recv_timeout(WAIT).is_ok());
        assert!(pool.worker_count() >= 2);
        pool.shutdown();
    }

    #[test]
    fn test_panicking_job_keeps_worker() {
        let pool = WorkerPool::default();
        let (tx, rx) = bounded(1);

        pool.submit(|| panic!("job failed")).unwrap();
        pool.submit(move || tx.send("still running").unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(WAIT), Ok("still running"));
        pool.shutdown();
    }

    #[test]
    fn test_idle_workers_exit() {
        let pool = WorkerPool::new(Duration::from_millis(20));
        let (tx, rx) = bounded(1);

        pool.submit(move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(WAIT).unwrap();

        let deadline = std::time::Instant::now() + WAIT;
        while pool.worker_count() > 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(pool.worker_count(), 0);

        // A new job starts a new worker
        let (tx, rx) = bounded(1);
        pool.submit(move || tx.send(()).unwrap()).unwrap();
        assert!(rx.recv_timeout(WAIT).is_ok());
    }

    #[test]
    fn test_submit_after_shutdown() {
        let pool = WorkerPool::default();
        pool.shutdown();

        assert!(matches!(pool.submit(|| {}), Err(PoolError::ShutDown)));
        assert_eq!(pool.queued_count(), 0);
    }
}
