//! Ordered, namespaced pub/sub registry for gangway.
//!
//! This crate provides the event bus underlying a gangway session: a
//! mapping from event names to ordered lists of subscriber callbacks,
//! with a reserved `"all"` name whose subscribers observe every trigger.
//! The bus knows nothing about transports or wire formats; it is usable
//! standalone wherever synchronous, insertion-ordered dispatch is wanted.

pub mod bus;

pub use bus::{callback, EventBus, Callback, Context, ALL};
