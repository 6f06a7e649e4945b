//! # Herald
//!
//! An in-process publish/subscribe registry for decoupling components inside
//! one program.
//!
//! ## Core Concepts
//!
//! - **Registry**: Maps event keys to ordered lists of handlers
//! - **Handlers**: Callbacks compared by identity, so a clone can unsubscribe
//! - **Fire-once**: Subscriptions delivered to at most one publish
//! - **Deferred publish**: Delivery scheduled after the current synchronous work
//!
//! ## Example
//!
//! ```
//! use herald::{Handler, ManualScheduler, Registry};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let scheduler = ManualScheduler::new();
//! let registry: Registry<&str, u32> = Registry::new(scheduler.clone());
//!
//! let total = Arc::new(AtomicU32::new(0));
//! let sum = Arc::clone(&total);
//! registry.subscribe(
//!     "add",
//!     Handler::new(move |n: Option<&u32>| {
//!         sum.fetch_add(n.copied().unwrap_or(0), Ordering::SeqCst);
//!     }),
//! );
//!
//! registry.publish("add", Some(&2));
//! registry.publish_deferred("add", Some(3)).unwrap();
//! assert_eq!(total.load(Ordering::SeqCst), 2);
//!
//! scheduler.run_pending();
//! assert_eq!(total.load(Ordering::SeqCst), 5);
//! ```

pub mod error;
pub mod scheduler;
pub mod subscriptions;

// Re-exports
pub use error::{HeraldError, Result};
pub use scheduler::{
    ManualScheduler, Scheduler, SchedulerConfig, Task, ThreadScheduler, UnitGuard,
};
pub use subscriptions::{Handler, Registry};
