//! Keyed subscriber registry.
//!
//! Handlers subscribe to an event key and receive the payload of every
//! publish to that key:
//! - Delivery follows registration order
//! - Each publish works on a snapshot of the subscriber list
//! - Fire-once subscriptions remove themselves before running
//! - Deferred publishes run later through a [`Scheduler`](crate::Scheduler)
//!
//! # Example
//!
//! ```ignore
//! let registry: Registry<&str, String> = Registry::new(ManualScheduler::new());
//!
//! let greet = Handler::new(|name: Option<&String>| {
//!     println!("hello {}", name.map_or("nobody", |n| n.as_str()));
//! });
//!
//! registry
//!     .subscribe("join", greet.clone())
//!     .publish("join", Some(&"ada".to_string()))
//!     .unsubscribe("join", Some(&greet));
//! ```

mod manager;
mod types;

pub use manager::Registry;
pub use types::Handler;
