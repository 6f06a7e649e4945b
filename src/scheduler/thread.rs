//! A scheduler backed by a dedicated worker thread.

use crate::error::{HeraldError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use super::types::{Scheduler, SchedulerConfig, Task};

/// Runs deferred tasks one at a time on a worker thread, in submission order.
///
/// Each calling thread is treated as one synchronous unit of work. Tasks it
/// schedules are held back until it calls [`yield_now`](Self::yield_now), or
/// until a guard from [`unit`](Self::unit) is dropped, and only then handed to
/// the worker. Tasks scheduled from inside a running task go straight to the
/// worker queue: the worker finishes the current task before taking the next.
///
/// Held tasks keep whatever they capture alive, including a registry that
/// owns this scheduler. Yield or shut down before dropping the last handle.
pub struct ThreadScheduler {
    sender: Mutex<Option<Sender<Task>>>,
    staged: Mutex<HashMap<ThreadId, Vec<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
    name: String,
}

/// Ends a synchronous unit on drop by releasing the current thread's tasks.
#[must_use = "dropping the guard immediately releases deferred work"]
pub struct UnitGuard<'a> {
    scheduler: &'a ThreadScheduler,
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.scheduler.yield_now() {
            tracing::warn!(error = %e, "deferred tasks dropped at end of unit");
        }
    }
}

impl ThreadScheduler {
    /// Spawn the worker thread.
    pub fn spawn(config: SchedulerConfig) -> Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let catch_panics = config.catch_panics;

        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_worker(receiver, catch_panics))?;

        tracing::debug!(thread = %config.thread_name, "deferred scheduler started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            staged: Mutex::new(HashMap::new()),
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
            name: config.thread_name,
        })
    }

    /// Whether the scheduler still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
            && self
                .worker
                .lock()
                .as_ref()
                .map_or(false, |worker| !worker.is_finished())
    }

    /// Number of tasks the current thread has scheduled but not yet released.
    pub fn staged(&self) -> usize {
        self.staged
            .lock()
            .get(&thread::current().id())
            .map_or(0, Vec::len)
    }

    /// End the current thread's synchronous unit: hand its held tasks to the
    /// worker in the order they were scheduled. Returns how many were released.
    pub fn yield_now(&self) -> Result<usize> {
        let tasks = self
            .staged
            .lock()
            .remove(&thread::current().id())
            .unwrap_or_default();
        let released = tasks.len();

        self.send_all(tasks)?;
        if released > 0 {
            tracing::trace!(released, "released deferred tasks");
        }
        Ok(released)
    }

    /// Start a synchronous unit that ends, releasing held tasks, when the
    /// returned guard is dropped.
    pub fn unit(&self) -> UnitGuard<'_> {
        UnitGuard { scheduler: self }
    }

    /// Stop accepting tasks, release everything still held, let the worker
    /// finish what is queued, and wait for it.
    ///
    /// Called from inside a task, the worker is detached instead of joined.
    pub fn shutdown(&self) {
        let staged = std::mem::take(&mut *self.staged.lock());
        for (_, tasks) in staged {
            if self.send_all(tasks).is_err() {
                tracing::warn!(thread = %self.name, "held tasks dropped on shutdown");
            }
        }

        // Dropping the only sender disconnects the channel once drained.
        drop(self.sender.lock().take());

        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        if worker.thread().id() == thread::current().id() {
            tracing::debug!(thread = %self.name, "deferred scheduler detached from its own task");
            return;
        }

        if worker.join().is_err() {
            tracing::error!(thread = %self.name, "deferred scheduler worker panicked");
        } else {
            tracing::debug!(thread = %self.name, "deferred scheduler stopped");
        }
    }

    fn send_all(&self, tasks: Vec<Task>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let sender = self.sender.lock();
        let tx = sender.as_ref().ok_or(HeraldError::SchedulerClosed)?;
        for task in tasks {
            tx.send(task).map_err(|_| HeraldError::SchedulerClosed)?;
        }
        Ok(())
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, task: Task) -> Result<()> {
        if !self.is_running() {
            return Err(HeraldError::SchedulerClosed);
        }

        let current = thread::current().id();
        if current == self.worker_id {
            return self.send_all(vec![task]);
        }

        self.staged.lock().entry(current).or_default().push(task);
        Ok(())
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run_worker(receiver: Receiver<Task>, catch_panics: bool) {
    // Yields queued tasks even after the sender is gone.
    for task in receiver.iter() {
        if !catch_panics {
            task();
            continue;
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            tracing::error!(
                panic = %panic_message(payload.as_ref()),
                "deferred task panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
