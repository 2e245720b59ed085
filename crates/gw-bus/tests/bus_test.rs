//! Integration tests for the gangway event bus.
//!
//! Covers the ordering and removal guarantees application code relies on:
//! insertion-order dispatch, wildcard delivery with the event name
//! prepended, selective removal by callback/context pair, and the
//! clear-everything teardown path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use gw_bus::{callback, Callback, Context, EventBus, ALL};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A callback that appends `tag` to a shared log on every invocation.
fn tagged(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Callback {
    let log = log.clone();
    callback(move |_| log.lock().unwrap().push(tag))
}

// ===========================================================================
// Ordering
// ===========================================================================

#[test]
fn test_subscribers_fire_in_registration_order() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.on("step", tagged(&log, "s1"), None);
    bus.on("step", tagged(&log, "s2"), None);
    bus.on("step", tagged(&log, "s3"), None);

    bus.trigger("step", &[]);
    bus.trigger("step", &[]);

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &["s1", "s2", "s3", "s1", "s2", "s3"]
    );
}

#[test]
fn test_named_subscribers_fire_before_wildcard() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.on(ALL, tagged(&log, "wildcard"), None);
    bus.on("step", tagged(&log, "named"), None);

    bus.trigger("step", &[]);

    assert_eq!(log.lock().unwrap().as_slice(), &["named", "wildcard"]);
}

// ===========================================================================
// Wildcard delivery
// ===========================================================================

#[test]
fn test_wildcard_sees_every_event_with_name_first() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let cb = {
        let seen = seen.clone();
        callback(move |args| seen.lock().unwrap().push(args.to_vec()))
    };
    bus.on(ALL, cb, None);

    let named_fires = Arc::new(AtomicUsize::new(0));
    let named = {
        let named_fires = named_fires.clone();
        callback(move |_| {
            named_fires.fetch_add(1, Ordering::SeqCst);
        })
    };
    bus.on("ready", named, None);

    bus.trigger("ready", &[json!({"token": "abc"})]);
    bus.trigger("change", &[json!(1), json!(2)]);

    assert_eq!(named_fires.load(Ordering::SeqCst), 1);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[
            vec![json!("ready"), json!({"token": "abc"})],
            vec![json!("change"), json!(1), json!(2)],
        ]
    );
}

// ===========================================================================
// Selective removal
// ===========================================================================

#[test]
fn test_off_removes_only_the_matching_pair() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let s1 = tagged(&log, "s1");
    let s2 = tagged(&log, "s2");
    let ctx_a: Context = Arc::new("ctx-a");
    let ctx_b: Context = Arc::new("ctx-b");

    bus.on("x", s1.clone(), Some(ctx_a.clone()));
    bus.on("x", s2, Some(ctx_b));

    bus.off(Some("x"), Some(&s1), Some(&ctx_a));
    bus.trigger("x", &[]);

    assert_eq!(log.lock().unwrap().as_slice(), &["s2"]);
}

#[test]
fn test_off_with_mismatched_context_removes_nothing() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let s1 = tagged(&log, "s1");
    let ctx_a: Context = Arc::new("ctx-a");
    let other: Context = Arc::new("other");

    bus.on("x", s1.clone(), Some(ctx_a));
    bus.off(Some("x"), Some(&s1), Some(&other));
    bus.trigger("x", &[]);

    assert_eq!(log.lock().unwrap().as_slice(), &["s1"]);
}

// ===========================================================================
// Teardown
// ===========================================================================

#[test]
fn test_clear_everything_silences_all_names() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.on("a", tagged(&log, "a"), None);
    bus.on("b c", tagged(&log, "bc"), None);
    bus.on(ALL, tagged(&log, "all"), None);

    bus.off(None, None, None);
    bus.trigger("a b c", &[]);

    assert!(log.lock().unwrap().is_empty());
    assert!(bus.is_empty());
}
