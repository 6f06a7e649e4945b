//! A FIFO scheduler driven by the caller.

use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use super::types::{Scheduler, Task};

/// Queue of deferred tasks that only runs when asked to.
///
/// Models the "next tick" of a cooperative event loop: scheduling never runs
/// anything, and [`run_pending`](Self::run_pending) plays the role of the
/// loop picking up deferred work once the current synchronous code yields.
/// Clones share the same queue.
///
/// Queued tasks own what they capture. A deferred publish captures its
/// registry, and the registry owns this scheduler, so a queue that is never
/// drained keeps both alive. Call [`run_pending`](Self::run_pending) before
/// dropping the last handle.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued task. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // Pop before running so a task may schedule more work.
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until the queue is empty, including tasks scheduled
    /// while draining. Returns the number of tasks run.
    ///
    /// A panicking task unwinds out of this call; tasks behind it stay queued.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, "drained deferred tasks");
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task) -> Result<()> {
        self.queue.lock().push_back(task);
        Ok(())
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
