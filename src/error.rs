//! Error types for the event registry.

use thiserror::Error;

/// Main error type for registry and scheduler operations.
///
/// Registry bookkeeping itself never fails: publishing to an unknown key or
/// removing a handler that is not subscribed is a no-op. Errors only come
/// from the deferred-execution side.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("Scheduler is closed and no longer accepts tasks")]
    SchedulerClosed,

    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, HeraldError>;
