//! In-process ambient contexts joined by delivery queues.
//!
//! A [`Pane`] stands in for one isolated execution context: it has an
//! origin, a queue of raw messages other panes have posted to it, a set
//! of attached listeners, and a key→handle registry backing lookups.
//! Ports obtained from [`Pane::port_for`] deliver into the pane's queue
//! stamped with the sender's origin; [`Pane::pump`] drains the queue into
//! the attached listeners. The queue is the modeled asynchronous
//! transport boundary — nothing is delivered until someone pumps.
//!
//! Used by the test suites and by same-process embeddings that want the
//! session protocol without a platform transport underneath.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use tracing::trace;

use crate::context::{
    AmbientContext, Handle, InboundMessage, ListenerId, MessageListener, MessagePort,
};
use crate::origin::WILDCARD;

struct Delivery {
    data: String,
    origin: String,
}

/// One side of an in-process cross-context link.
pub struct Pane {
    origin: String,
    inbox_tx: flume::Sender<Delivery>,
    inbox_rx: flume::Receiver<Delivery>,
    listeners: Mutex<Vec<(ListenerId, MessageListener)>>,
    handles: Mutex<AHashMap<String, Handle>>,
    parent: Mutex<Option<Arc<dyn MessagePort>>>,
}

impl Pane {
    pub fn new(origin: impl Into<String>) -> Arc<Pane> {
        let (inbox_tx, inbox_rx) = flume::unbounded();
        Arc::new(Pane {
            origin: origin.into(),
            inbox_tx,
            inbox_rx,
            listeners: Mutex::new(Vec::new()),
            handles: Mutex::new(AHashMap::new()),
            parent: Mutex::new(None),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// A port that posts into this pane, with posts attributed to
    /// `sender`'s origin.
    pub fn port_for(&self, sender: &Pane) -> Arc<dyn MessagePort> {
        Arc::new(PanePort {
            inbox: self.inbox_tx.clone(),
            sender_origin: sender.origin.clone(),
            pane_origin: self.origin.clone(),
        })
    }

    /// Wire this pane's parent port.
    pub fn adopt(&self, parent: Arc<dyn MessagePort>) {
        *self.parent.lock().expect("pane parent lock poisoned") = Some(parent);
    }

    /// Make `key` resolvable through this pane's lookup capability.
    pub fn register(&self, key: impl Into<String>, handle: Handle) {
        self.handles
            .lock()
            .expect("pane handle lock poisoned")
            .insert(key.into(), handle);
    }

    /// Deliver every queued message to the attached listeners, in arrival
    /// order. Returns the number of messages delivered.
    ///
    /// Listener invocation is synchronous; a panicking listener aborts
    /// the pump and leaves the remaining queue intact.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while let Ok(delivery) = self.inbox_rx.try_recv() {
            let snapshot: Vec<MessageListener> = self
                .listeners
                .lock()
                .expect("pane listener lock poisoned")
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();

            let message = InboundMessage {
                data: delivery.data,
                origin: delivery.origin,
            };
            for listener in &snapshot {
                listener(&message);
            }
            delivered += 1;
        }
        delivered
    }

    /// Number of currently attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("pane listener lock poisoned")
            .len()
    }
}

impl AmbientContext for Pane {
    fn parent(&self) -> Option<Arc<dyn MessagePort>> {
        self.parent.lock().expect("pane parent lock poisoned").clone()
    }

    fn lookup(&self, key: &str) -> Option<Handle> {
        self.handles
            .lock()
            .expect("pane handle lock poisoned")
            .get(key)
            .cloned()
    }

    fn attach_listener(&self, listener: MessageListener) -> Option<ListenerId> {
        let id = ListenerId::new();
        self.listeners
            .lock()
            .expect("pane listener lock poisoned")
            .push((id, listener));
        Some(id)
    }

    fn detach_listener(&self, id: ListenerId) {
        self.listeners
            .lock()
            .expect("pane listener lock poisoned")
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Wire `guest` as an embedded child of `host`: the guest's parent port
/// posts into the host.
pub fn link(host: &Arc<Pane>, guest: &Arc<Pane>) {
    guest.adopt(host.port_for(guest));
}

/// A port into one pane, attributed to one sender origin.
struct PanePort {
    inbox: flume::Sender<Delivery>,
    sender_origin: String,
    pane_origin: String,
}

impl MessagePort for PanePort {
    fn post(&self, payload: &str, target_origin: &str) {
        // The transport's own scoping rule: a post whose target-origin
        // pattern does not match the receiving context is dropped before
        // delivery.
        if target_origin != WILDCARD && target_origin != self.pane_origin {
            trace!(
                target = target_origin,
                pane = %self.pane_origin,
                "target origin mismatch; dropping post"
            );
            return;
        }
        let _ = self.inbox.send(Delivery {
            data: payload.to_string(),
            origin: self.sender_origin.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn recording_listener() -> (Arc<Mutex<Vec<InboundMessage>>>, MessageListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener: MessageListener = {
            let seen = seen.clone();
            Arc::new(move |message: &InboundMessage| {
                seen.lock().unwrap().push(message.clone());
            })
        };
        (seen, listener)
    }

    #[test]
    fn post_is_queued_until_pumped() {
        let a = Pane::new("https://a.example");
        let b = Pane::new("https://b.example");
        let (seen, listener) = recording_listener();
        b.attach_listener(listener);

        b.port_for(&a).post("hello", WILDCARD);
        assert!(seen.lock().unwrap().is_empty());

        assert_eq!(b.pump(), 1);
        let messages = seen.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "hello");
        assert_eq!(messages[0].origin, "https://a.example");
    }

    #[test]
    fn pump_preserves_arrival_order() {
        let a = Pane::new("https://a.example");
        let b = Pane::new("https://b.example");
        let (seen, listener) = recording_listener();
        b.attach_listener(listener);

        let port = b.port_for(&a);
        port.post("first", WILDCARD);
        port.post("second", WILDCARD);
        assert_eq!(b.pump(), 2);

        let data: Vec<String> = seen.lock().unwrap().iter().map(|m| m.data.clone()).collect();
        assert_eq!(data, ["first", "second"]);
    }

    #[test]
    fn mismatched_target_origin_is_dropped_at_the_port() {
        let a = Pane::new("https://a.example");
        let b = Pane::new("https://b.example");
        let count = Arc::new(AtomicUsize::new(0));
        let listener: MessageListener = {
            let count = count.clone();
            Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        b.attach_listener(listener);

        let port = b.port_for(&a);
        port.post("scoped", "https://elsewhere.example");
        assert_eq!(b.pump(), 0);

        port.post("scoped", "https://b.example");
        assert_eq!(b.pump(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detach_silences_a_listener() {
        let a = Pane::new("https://a.example");
        let b = Pane::new("https://b.example");
        let (seen, listener) = recording_listener();
        let id = b.attach_listener(listener).unwrap();
        b.detach_listener(id);
        assert_eq!(b.listener_count(), 0);

        b.port_for(&a).post("gone", WILDCARD);
        // The message still drains from the queue; nobody hears it.
        assert_eq!(b.pump(), 1);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn link_wires_guest_parent_into_host() {
        let host = Pane::new("https://host.example");
        let guest = Pane::new("https://guest.example");
        link(&host, &guest);

        let (seen, listener) = recording_listener();
        host.attach_listener(listener);

        guest.parent().unwrap().post("up", WILDCARD);
        assert_eq!(host.pump(), 1);
        assert_eq!(seen.lock().unwrap()[0].origin, "https://guest.example");
    }
}
