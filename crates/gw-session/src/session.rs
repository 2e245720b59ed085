//! The session: a multiplexed, origin-filtered event channel over the
//! ambient context's shared transport.
//!
//! A session owns a set of resolved endpoints, an inbound bus carrying
//! application subscriptions, and an outbound bus whose single wildcard
//! subscriber serializes every trigger into the wire envelope and fans it
//! out to each endpoint's target. One listener on the ambient context
//! feeds the inbound side: raw payloads are decoded, origin-filtered, and
//! re-triggered on the inbound bus. Everything is synchronous; the only
//! asynchronous boundary is the transport underneath.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use gw_bus::{Callback, Context, EventBus, ALL};

use crate::context::{AmbientContext, InboundMessage, ListenerId, MessageListener};
use crate::endpoint::{Endpoint, EndpointConfig};
use crate::origin::OriginSet;
use crate::protocol;

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    delivered: AtomicU64,
    dropped_decode: AtomicU64,
    dropped_origin: AtomicU64,
}

/// A snapshot of a session's traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Envelopes posted to endpoint targets (one per endpoint per trigger).
    pub sent: u64,
    /// Inbound messages decoded, accepted, and dispatched.
    pub delivered: u64,
    /// Inbound payloads dropped because they were not well-formed envelopes.
    pub dropped_decode: u64,
    /// Inbound envelopes dropped because their origin was not accepted.
    pub dropped_origin: u64,
}

/// A live event channel across the ambient context's transport.
///
/// Built with [`Session::open`]; torn down with [`Session::end`] (or on
/// drop). After `end()` the session is terminal: every operation becomes
/// a no-op and no inbound delivery can occur — there is no resurrection.
pub struct Session {
    context: Arc<dyn AmbientContext>,
    endpoints: Arc<Vec<Endpoint>>,
    inbound: Arc<EventBus>,
    outbound: EventBus,
    listener: ListenerId,
    ended: AtomicBool,
    counters: Arc<Counters>,
}

impl Session {
    /// Open a session over `context` with the given endpoint
    /// configurations.
    ///
    /// Zero configurations means a single default configuration targeting
    /// the enclosing context's parent. Configurations that cannot be
    /// resolved to a postable target are skipped with a warning — they
    /// degrade the session, they do not fail it. Endpoints are
    /// deduplicated by their `(from, to)` pair combined with target
    /// identity: an identical `(from, to, target)` triple is a no-op,
    /// while the same pair with a different target replaces the earlier
    /// mapping in place.
    ///
    /// Returns `None` (after a warning) when the ambient context cannot
    /// attach message listeners; opening a session speculatively in an
    /// environment without a transport is legitimate, so this is a
    /// degraded outcome rather than an error.
    pub fn open(context: Arc<dyn AmbientContext>, configs: Vec<EndpointConfig>) -> Option<Session> {
        let configs = if configs.is_empty() {
            vec![EndpointConfig::default()]
        } else {
            configs
        };

        let mut endpoints: Vec<Endpoint> = Vec::new();
        let mut accepted = OriginSet::new();
        for config in configs {
            let Some(endpoint) = Endpoint::resolve(context.as_ref(), config) else {
                continue;
            };
            accepted.insert(endpoint.from().to_string());
            match endpoints.iter().position(|known| known.same_pair(&endpoint)) {
                Some(index) => {
                    if !endpoints[index].same_target(&endpoint) {
                        endpoints[index] = endpoint;
                    }
                }
                None => endpoints.push(endpoint),
            }
        }

        let endpoints = Arc::new(endpoints);
        let inbound = Arc::new(EventBus::new());
        let outbound = EventBus::new();
        let counters = Arc::new(Counters::default());

        // The outbound bus has exactly one permanent subscriber: the
        // serializer, fanning every trigger out to every endpoint.
        let serializer: Callback = {
            let endpoints = endpoints.clone();
            let counters = counters.clone();
            gw_bus::callback(move |args| {
                let Some(Value::String(event)) = args.first() else {
                    return;
                };
                let payload = protocol::encode(event, &args[1..]);
                for endpoint in endpoints.iter() {
                    trace!(event = %event, to = endpoint.to(), "posting envelope");
                    endpoint.target().post(&payload, endpoint.to());
                    counters.sent.fetch_add(1, Ordering::Relaxed);
                }
            })
        };
        outbound.on(ALL, serializer, None);

        let listener: MessageListener = {
            let inbound = inbound.clone();
            let counters = counters.clone();
            Arc::new(move |message: &InboundMessage| {
                let envelope = match protocol::decode(&message.data) {
                    Ok(envelope) => envelope,
                    Err(error) => {
                        // Foreign traffic on a shared transport is
                        // expected; drop it without comment.
                        trace!(origin = %message.origin, %error, "dropping undecodable payload");
                        counters.dropped_decode.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                };
                if !accepted.accepts(&message.origin) {
                    trace!(
                        origin = %message.origin,
                        event = %envelope.event,
                        "dropping envelope from unaccepted origin"
                    );
                    counters.dropped_origin.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                inbound.trigger(&envelope.event, &envelope.args);
            })
        };

        let Some(listener_id) = context.attach_listener(listener) else {
            warn!("ambient context cannot attach message listeners; session unavailable");
            return None;
        };

        debug!(endpoints = endpoints.len(), "session opened");

        Some(Session {
            context,
            endpoints,
            inbound,
            outbound,
            listener: listener_id,
            ended: AtomicBool::new(false),
            counters,
        })
    }

    /// Subscribe to inbound application events. Delegates to the inbound
    /// bus; see [`EventBus::on`]. No-op after [`end`](Session::end).
    pub fn on(&self, names: &str, callback: Callback, context: Option<Context>) -> &Self {
        if !self.is_ended() {
            self.inbound.on(names, callback, context);
        }
        self
    }

    /// Unsubscribe inbound handlers. Delegates to the inbound bus; see
    /// [`EventBus::off`]. No-op after [`end`](Session::end).
    pub fn off(
        &self,
        names: Option<&str>,
        callback: Option<&Callback>,
        context: Option<&Context>,
    ) -> &Self {
        if !self.is_ended() {
            self.inbound.off(names, callback, context);
        }
        self
    }

    /// Publish an event to every endpoint: the serializer encodes
    /// `(names, args)` into the wire envelope and posts it to each
    /// endpoint's target, scoped by that endpoint's `to` pattern.
    /// No-op after [`end`](Session::end).
    pub fn trigger(&self, names: &str, args: &[Value]) -> &Self {
        if !self.is_ended() {
            self.outbound.trigger(names, args);
        }
        self
    }

    /// Tear the session down: clear both buses, detach the transport
    /// listener, and transition to the terminal Ended state. Idempotent;
    /// every subsequent operation on the session is a no-op.
    pub fn end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inbound.off(None, None, None);
        self.outbound.off(None, None, None);
        self.context.detach_listener(self.listener);
        debug!("session ended");
    }

    /// Whether [`end`](Session::end) has run.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Number of live endpoints after dedup.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Snapshot the traffic counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped_decode: self.counters.dropped_decode.load(Ordering::Relaxed),
            dropped_origin: self.counters.dropped_origin.load(Ordering::Relaxed),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints.len())
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}
