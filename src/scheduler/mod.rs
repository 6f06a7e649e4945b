//! Deferred execution for `publish_deferred`.
//!
//! A [`Scheduler`] takes boxed tasks and runs them later, in the order they
//! were submitted. Two implementations ship with the crate:
//! - [`ManualScheduler`]: a queue the caller drains explicitly, for
//!   cooperative loops and deterministic tests
//! - [`ThreadScheduler`]: a worker thread that runs each caller's tasks once
//!   that caller yields
//!
//! # Example
//!
//! ```ignore
//! let scheduler = ManualScheduler::new();
//! let registry: Registry<&str, u32> = Registry::new(scheduler.clone());
//!
//! registry.publish_deferred("tick", Some(1))?;
//! // Nothing delivered yet.
//! scheduler.run_pending();
//! ```

mod manual;
mod thread;
mod types;

pub use manual::ManualScheduler;
pub use thread::{ThreadScheduler, UnitGuard};
pub use types::{Scheduler, SchedulerConfig, Task};
