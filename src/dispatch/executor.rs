//! Execution capability used by buffered sinks for asynchronous batch delivery
//!
//! The buffered sink never spawns threads itself. It hands each batch to an [`Executor`] as a
//! boxed job and keeps the returned [`TaskHandle`] so an explicit flush can wait for it.

use crate::core::{error::panic_message, LoggerError, Result};
use crate::core::logger::DEFAULT_SHUTDOWN_TIMEOUT;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Unit of work submitted to an executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs off the caller's thread
pub trait Executor: Send + Sync {
    /// Schedule a job, returning a handle that completes when the job has run
    ///
    /// Returns [`LoggerError::ExecutorRejected`] when the job cannot be accepted. A rejected
    /// job is dropped without running.
    fn submit(&self, job: Job) -> Result<TaskHandle>;
}

#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

/// Completion handle of a submitted job
#[derive(Clone)]
pub struct TaskHandle {
    completion: Arc<Completion>,
}

impl TaskHandle {
    /// Wrap a job so that the returned handle completes once it has run, panicked or not
    pub fn track(job: Job) -> (Job, TaskHandle) {
        let handle = TaskHandle {
            completion: Arc::new(Completion::default()),
        };
        let completion = Arc::clone(&handle.completion);

        let tracked: Job = Box::new(move || {
            let _guard = CompleteOnDrop(completion);
            job();
        });
        (tracked, handle)
    }

    /// Handle that is already complete
    pub fn completed() -> Self {
        let handle = TaskHandle {
            completion: Arc::new(Completion::default()),
        };
        *handle.completion.done.lock() = true;
        handle
    }

    pub fn is_pending(&self) -> bool {
        !*self.completion.done.lock()
    }

    /// Block until the job has finished
    pub fn wait(&self) {
        let mut done = self.completion.done.lock();
        while !*done {
            self.completion.cond.wait(&mut done);
        }
    }

    /// Block until the job has finished or the timeout elapses; returns whether it finished
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.completion.done.lock();
        while !*done {
            if self
                .completion
                .cond
                .wait_until(&mut done, deadline)
                .timed_out()
            {
                return *done;
            }
        }
        true
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Marks a task complete even when the job unwinds
struct CompleteOnDrop(Arc<Completion>);

impl Drop for CompleteOnDrop {
    fn drop(&mut self) {
        *self.0.done.lock() = true;
        self.0.cond.notify_all();
    }
}

/// Spawns one thread per job
#[derive(Debug, Default, Clone)]
pub struct ThreadExecutor {
    name: Option<String>,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name given to spawned threads
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Executor for ThreadExecutor {
    fn submit(&self, job: Job) -> Result<TaskHandle> {
        let (job, handle) = TaskHandle::track(job);
        let mut builder = thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        builder
            .spawn(job)
            .map_err(|e| LoggerError::executor_rejected(format!("thread spawn failed: {}", e)))?;
        Ok(handle)
    }
}

/// Fixed set of worker threads fed through a bounded channel
///
/// Submission never blocks: when the channel is full the job is rejected and the caller
/// decides what to do with it. Dropping the pool closes the channel, lets workers finish
/// queued jobs and joins them within [`DEFAULT_SHUTDOWN_TIMEOUT`].
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Create a pool with `workers` threads and room for `capacity` queued jobs
    pub fn new(workers: usize, capacity: usize) -> Result<Self> {
        crate::core::contract::require(
            "WorkerPool",
            &[
                ("worker count must be at least 1", workers >= 1),
                ("queue capacity must be at least 1", capacity >= 1),
            ],
        )?;

        let (sender, receiver) = bounded::<Job>(capacity);
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("event-dispatch-worker-{}", index))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let outcome =
                            std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
                        if let Err(payload) = outcome {
                            eprintln!(
                                "[LOGGER ERROR] Worker job panicked: {}",
                                panic_message(payload.as_ref())
                            );
                        }
                    }
                })?;
            handles.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers: handles,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    /// Override how long drop waits for workers to finish
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs accepted but not yet picked up by a worker
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }
}

impl Executor for WorkerPool {
    fn submit(&self, job: Job) -> Result<TaskHandle> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| LoggerError::executor_rejected("worker pool is shut down"))?;

        let (job, handle) = TaskHandle::track(job);
        match sender.try_send(job) {
            Ok(()) => Ok(handle),
            Err(TrySendError::Full(_)) => Err(LoggerError::executor_rejected(format!(
                "worker queue full ({} jobs)",
                sender.len()
            ))),
            Err(TrySendError::Disconnected(_)) => {
                Err(LoggerError::executor_rejected("all workers have exited"))
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        let start = Instant::now();
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            // A job holding the last reference drops the pool on a worker thread
            if handle.thread().id() == current {
                continue;
            }
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Worker thread panicked during shutdown: {:?}", e);
                    }
                    break;
                }

                if start.elapsed() >= self.shutdown_timeout {
                    eprintln!(
                        "[LOGGER WARNING] Worker thread did not finish within {:?} timeout. \
                         Queued batches may be lost.",
                        self.shutdown_timeout
                    );
                    return;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("queued", &self.queued())
            .finish()
    }
}

/// Runs jobs on a tokio runtime's blocking pool
#[cfg(feature = "tokio-executor")]
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio-executor")]
impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Executor bound to the runtime of the calling task
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| LoggerError::executor_rejected(e.to_string()))
    }
}

#[cfg(feature = "tokio-executor")]
impl Executor for TokioExecutor {
    fn submit(&self, job: Job) -> Result<TaskHandle> {
        let (job, handle) = TaskHandle::track(job);
        drop(self.handle.spawn_blocking(job));
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_thread_executor_runs_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let handle = ThreadExecutor::new()
            .with_thread_name("test-batch")
            .submit(Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        handle.wait();
        assert!(!handle.is_pending());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_pending_until_job_finishes() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let handle = ThreadExecutor::new()
            .submit(Box::new(move || {
                let _ = release_rx.recv();
            }))
            .unwrap();

        assert!(handle.is_pending());
        assert!(!handle.wait_timeout(Duration::from_millis(20)));

        release_tx.send(()).unwrap();
        assert!(handle.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_handle_completes_when_job_panics() {
        let handle = ThreadExecutor::new()
            .submit(Box::new(|| panic!("job failed")))
            .unwrap();
        assert!(handle.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_completed_handle() {
        let handle = TaskHandle::completed();
        assert!(!handle.is_pending());
        handle.wait();
    }

    #[test]
    fn test_worker_pool_runs_jobs() {
        let pool = WorkerPool::new(2, 16).unwrap();
        assert_eq!(pool.worker_count(), 2);

        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap()
            })
            .collect();

        for handle in &handles {
            handle.wait();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_worker_pool_rejects_when_full() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();

        let blocker = pool
            .submit(Box::new(move || {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
            }))
            .unwrap();
        started_rx.recv().unwrap();

        pool.submit(Box::new(|| {})).unwrap();
        let err = pool.submit(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, LoggerError::ExecutorRejected(_)));

        release_tx.send(()).unwrap();
        blocker.wait();
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = WorkerPool::new(1, 4).unwrap();
        pool.submit(Box::new(|| panic!("bad job"))).unwrap().wait();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        pool.submit(Box::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap()
        .wait();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_pool_rejects_zero_workers() {
        assert!(WorkerPool::new(0, 4).unwrap_err().is_configuration());
        assert!(WorkerPool::new(1, 0).is_err());
    }

    #[cfg(feature = "tokio-executor")]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_tokio_executor_runs_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let handle = TokioExecutor::current()
            .unwrap()
            .submit(Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        tokio::task::spawn_blocking(move || handle.wait())
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
