//! Fixed-size worker pool for chunk work
//!
//! A named `rayon` thread pool. Submitted closures report back through a
//! `tokio` oneshot channel, so callers can either block on the result or poll
//! it from a frame loop. Parallel iterators used inside a task run on the same
//! pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::core::{Error, Result};

type TaskResult<T> = std::result::Result<T, String>;

/// Pending result of a submitted task
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes.
    ///
    /// Must not be called from inside a pool worker.
    pub fn wait(self) -> Result<T> {
        match self.rx.blocking_recv() {
            Ok(result) => result.map_err(task_panicked),
            Err(_) => Err(task_dropped()),
        }
    }

    /// Result of the task if it has finished
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result.map_err(task_panicked)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(task_dropped())),
        }
    }
}

fn task_panicked(message: String) -> Error {
    Error::WorkerPool(format!("task panicked: {message}"))
}

fn task_dropped() -> Error {
    Error::WorkerPool("task was dropped before it finished".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Count of worker threads that have exited
type ExitLatch = Arc<(Mutex<usize>, Condvar)>;

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
    exited: ExitLatch,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("threads", &self.threads).finish()
    }
}

impl WorkerPool {
    /// Start `threads` named workers (`chunk-worker-N`)
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::Config("worker pool needs at least one thread".to_string()));
        }

        let exited: ExitLatch = Arc::new((Mutex::new(0), Condvar::new()));
        let latch = Arc::clone(&exited);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("chunk-worker-{i}"))
            .exit_handler(move |_| {
                let (count, cvar) = &*latch;
                *count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
                cvar.notify_all();
            })
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        log::debug!("Started worker pool with {} threads", threads);
        Ok(Self { pool, threads, exited })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Queue a closure. Panics inside it surface as `Error::WorkerPool`.
    pub fn submit<T, F>(&self, f: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(&*p));
            // The receiver may have been dropped; nobody is waiting then
            let _ = tx.send(result);
        });
        TaskHandle { rx }
    }

    /// Finish queued work and join every worker thread.
    ///
    /// Must not be called from inside a pool worker.
    pub fn shutdown(self) {
        let Self { pool, threads, exited } = self;
        drop(pool);

        let (count, cvar) = &*exited;
        let mut done = count.lock().unwrap_or_else(PoisonError::into_inner);
        while *done < threads {
            done = cvar.wait(done).unwrap_or_else(PoisonError::into_inner);
        }
        log::debug!("Worker pool shut down ({} threads joined)", threads);
    }
}
