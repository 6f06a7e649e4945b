//! Scheduler trait and configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks later, after the caller's current synchronous work.
///
/// Implementations must not run a task before the unit of work that
/// scheduled it has finished, and must run tasks in the order they were
/// scheduled through the same instance. No timing guarantee beyond "as soon
/// as possible".
pub trait Scheduler: Send + Sync {
    /// Enqueue a task. Fails with `SchedulerClosed` once the scheduler
    /// stopped accepting work.
    fn schedule(&self, task: Task) -> Result<()>;
}

/// Configuration for a [`ThreadScheduler`](super::ThreadScheduler).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name given to the worker thread.
    /// Default: "herald-deferred"
    pub thread_name: String,

    /// Log panicking tasks through `tracing` and keep running.
    /// When false, a panic unwinds the worker thread like any uncaught panic,
    /// goes through the process panic hook, and closes the scheduler.
    /// Default: false
    pub catch_panics: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "herald-deferred".to_string(),
            catch_panics: false,
        }
    }
}
