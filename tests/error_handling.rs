//! Error handling and edge case tests.

use herald::{Handler, HeraldError, ManualScheduler, Registry, SchedulerConfig, ThreadScheduler};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn test_registry() -> (Registry<&'static str, u32>, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    (Registry::new(scheduler.clone()), scheduler)
}

fn counter() -> (Handler<u32>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&calls);
    let handler = Handler::new(move |_: Option<&u32>| {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (handler, calls)
}

// --- Unknown keys and handlers ---

#[test]
fn test_publish_unknown_key() {
    let (registry, _) = test_registry();

    // Should be a no-op, not an error
    registry.publish("nobody", Some(&1)).publish("nobody", None);
    assert_eq!(registry.listener_count(&"nobody"), 0);
}

#[test]
fn test_unsubscribe_unknown_key() {
    let (registry, _) = test_registry();
    let (handler, _) = counter();

    registry
        .unsubscribe("nobody", Some(&handler))
        .unsubscribe("nobody", None);
    assert_eq!(registry.listener_count(&"nobody"), 0);
}

#[test]
fn test_unsubscribe_handler_not_subscribed() {
    let (registry, _) = test_registry();
    let (subscribed, calls) = counter();
    let (stranger, _) = counter();

    registry
        .subscribe("e", subscribed)
        .unsubscribe("e", Some(&stranger))
        .publish("e", Some(&1));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handlers_with_same_body_are_distinct() {
    let (registry, _) = test_registry();
    let (first, first_calls) = counter();
    let second_calls = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&second_calls);
    let lookalike = Handler::new(move |_: Option<&u32>| {
        inner.fetch_add(1, Ordering::SeqCst);
    });

    registry
        .subscribe("e", first.clone())
        .subscribe("e", lookalike)
        .unsubscribe("e", Some(&first))
        .publish("e", None);

    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_referenced_and_fresh_keys_behave_alike() {
    let (registry, _) = test_registry();
    let (handler, calls) = counter();

    registry.publish("seen", None).unsubscribe("seen", None);

    for key in ["seen", "fresh"] {
        registry
            .unsubscribe(key, Some(&handler))
            .publish(key, Some(&1))
            .unsubscribe(key, None);
        assert_eq!(registry.listener_count(&key), 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// --- Handler panics ---

#[test]
fn test_panicking_handler_aborts_publish() {
    let (registry, _) = test_registry();
    let (before, before_calls) = counter();
    let (after, after_calls) = counter();

    registry
        .subscribe("e", before)
        .subscribe("e", Handler::new(|_: Option<&u32>| panic!("handler failed")))
        .subscribe("e", after);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        registry.publish("e", Some(&1));
    }));

    assert!(result.is_err());
    assert_eq!(before_calls.load(Ordering::SeqCst), 1);
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);

    // The registry is still usable afterwards.
    assert_eq!(registry.listener_count(&"e"), 3);
}

#[test]
fn test_panicking_once_handler_is_still_removed() {
    let (registry, _) = test_registry();

    registry.subscribe_once("e", Handler::new(|_: Option<&u32>| panic!("once failed")));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        registry.publish("e", None);
    }));

    assert!(result.is_err());
    assert_eq!(registry.listener_count(&"e"), 0);
}

#[test]
fn test_panicking_deferred_publish_propagates_from_drain() {
    let (registry, scheduler) = test_registry();
    let (handler, calls) = counter();

    registry
        .subscribe("bad", Handler::new(|_: Option<&u32>| panic!("deferred failed")))
        .subscribe("good", handler);
    registry
        .publish_deferred("bad", None)
        .unwrap()
        .publish_deferred("good", None)
        .unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| scheduler.run_pending()));
    assert!(result.is_err());

    // Work queued behind the failure is kept for the next drain.
    assert_eq!(scheduler.pending(), 1);
    scheduler.run_pending();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// --- Scheduler errors ---

#[test]
fn test_publish_deferred_on_closed_scheduler() {
    let scheduler = Arc::new(ThreadScheduler::spawn(SchedulerConfig::default()).unwrap());
    let registry: Registry<&'static str, u32> = Registry::with_scheduler(scheduler.clone());

    scheduler.shutdown();

    let result = registry.publish_deferred("e", Some(1));
    assert!(matches!(result, Err(HeraldError::SchedulerClosed)));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        HeraldError::SchedulerClosed.to_string(),
        "Scheduler is closed and no longer accepts tasks"
    );

    let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
    let err: HeraldError = io.into();
    assert!(matches!(err, HeraldError::Spawn(_)));
    assert!(err.to_string().contains("no threads"));
}
