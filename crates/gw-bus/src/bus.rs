use std::any::Any;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use serde_json::Value;

/// Reserved event name whose subscribers fire on every trigger,
/// receiving the triggered event's name prepended to the arguments.
pub const ALL: &str = "all";

/// A subscriber callback. Arguments arrive as a JSON value slice; for
/// `"all"` subscribers the first element is the event name.
///
/// Callbacks are compared by pointer identity in [`EventBus::off`], so a
/// caller that wants to unsubscribe later must keep a clone of the `Arc`
/// it registered.
pub type Callback = Arc<dyn Fn(&[Value]) + Send + Sync + 'static>;

/// An opaque registration tag used to group subscriptions for removal.
/// Compared by pointer identity, never inspected.
pub type Context = Arc<dyn Any + Send + Sync + 'static>;

/// Wrap a closure into a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&[Value]) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
struct Subscriber {
    callback: Callback,
    context: Option<Context>,
}

impl Subscriber {
    /// Whether this node is removed by the given `off` filters.
    ///
    /// A context filter on its own never matches: node-level removal
    /// requires a callback filter (see [`EventBus::off`]).
    fn removed_by(&self, callback: Option<&Callback>, context: Option<&Context>) -> bool {
        let Some(cb) = callback else {
            return false;
        };
        if !Arc::ptr_eq(cb, &self.callback) {
            return false;
        }
        match context {
            None => true,
            Some(ctx) => self
                .context
                .as_ref()
                .is_some_and(|own| Arc::ptr_eq(ctx, own)),
        }
    }
}

/// Ordered, namespaced subscriber registry.
///
/// Subscribers for an event name fire in registration order. Dispatch is
/// synchronous on the calling thread and operates on a snapshot of the
/// registry, so callbacks may re-enter the bus (`on`/`off`/`trigger`)
/// without deadlocking; registrations made during a trigger take effect
/// from the next trigger. A panicking callback propagates to the caller
/// and interrupts delivery to the remaining subscribers of that trigger —
/// callers needing isolation must wrap their callbacks.
pub struct EventBus {
    registry: Mutex<AHashMap<String, Vec<Subscriber>>>,
}

impl EventBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(AHashMap::new()),
        }
    }

    /// Register `callback` for each whitespace-separated name in `names`.
    ///
    /// Registrations accumulate; the same callback may be registered any
    /// number of times and will fire once per registration. `context` is
    /// an optional tag for later selective removal.
    pub fn on(&self, names: &str, callback: Callback, context: Option<Context>) -> &Self {
        let mut registry = self.registry.lock().expect("bus registry lock poisoned");
        for name in names.split_whitespace() {
            registry
                .entry(name.to_string())
                .or_default()
                .push(Subscriber {
                    callback: callback.clone(),
                    context: context.clone(),
                });
        }
        self
    }

    /// Remove subscribers.
    ///
    /// - No filters: clears the whole registry.
    /// - `names` only: drops the entire subscriber list for each name.
    /// - `names` absent but `callback`/`context` given: applies the
    ///   filter across every registered name.
    /// - With a `callback` filter, a node is removed when its callback is
    ///   the same `Arc` and, if a `context` filter is also given, its
    ///   context is the same `Arc`. Survivors keep their relative order.
    ///
    /// A `context` filter without a `callback` filter removes nothing:
    /// node-level matching requires the callback. Callers that want
    /// context-scoped removal must pass the callback as well.
    ///
    /// Calling `off` on a bus with no registrations is a no-op.
    pub fn off(
        &self,
        names: Option<&str>,
        callback: Option<&Callback>,
        context: Option<&Context>,
    ) -> &Self {
        let mut registry = self.registry.lock().expect("bus registry lock poisoned");

        if names.is_none() && callback.is_none() && context.is_none() {
            registry.clear();
            return self;
        }

        let targets: Vec<String> = match names {
            Some(list) => list.split_whitespace().map(str::to_string).collect(),
            None => registry.keys().cloned().collect(),
        };

        for name in targets {
            if callback.is_none() && context.is_none() {
                registry.remove(&name);
                continue;
            }
            if let Some(subs) = registry.get_mut(&name) {
                subs.retain(|sub| !sub.removed_by(callback, context));
                if subs.is_empty() {
                    registry.remove(&name);
                }
            }
        }
        self
    }

    /// Fire every subscriber registered for each whitespace-separated
    /// name in `names`, in registration order, with `args`; then fire
    /// every `"all"` subscriber with the event name prepended.
    ///
    /// Triggering a name with no subscribers is a no-op.
    pub fn trigger(&self, names: &str, args: &[Value]) -> &Self {
        for name in names.split_whitespace() {
            let (named, all) = {
                let registry = self.registry.lock().expect("bus registry lock poisoned");
                (
                    registry.get(name).cloned().unwrap_or_default(),
                    registry.get(ALL).cloned().unwrap_or_default(),
                )
            };

            tracing::trace!(
                event = name,
                subscribers = named.len(),
                wildcard = all.len(),
                "dispatch"
            );

            for sub in &named {
                (sub.callback)(args);
            }

            if !all.is_empty() {
                let mut prefixed = Vec::with_capacity(args.len() + 1);
                prefixed.push(Value::String(name.to_string()));
                prefixed.extend_from_slice(args);
                for sub in &all {
                    (sub.callback)(&prefixed);
                }
            }
        }
        self
    }

    /// Number of subscribers currently registered for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let registry = self.registry.lock().expect("bus registry lock poisoned");
        registry.get(name).map_or(0, Vec::len)
    }

    /// Whether the bus has no subscribers at all.
    pub fn is_empty(&self) -> bool {
        let registry = self.registry.lock().expect("bus registry lock poisoned");
        registry.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock().expect("bus registry lock poisoned");
        let mut map = f.debug_map();
        for (name, subs) in registry.iter() {
            map.entry(name, &subs.len());
        }
        map.finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
