//! Capability traits the session consumes from its surroundings.
//!
//! A session never talks to a concrete transport. It posts strings through
//! [`MessagePort`] handles and hears inbound traffic through a listener
//! attached to the [`AmbientContext`] — the enclosing execution context's
//! view of the shared transport. Real embeddings implement these traits
//! over their platform's messaging surface; [`crate::link`] provides an
//! in-process implementation.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// A postable remote context.
///
/// Delivery is fire-and-forget: the transport offers no acknowledgement,
/// no ordering across targets, and no error channel. `target_origin`
/// scopes the post — a transport must drop the payload rather than hand
/// it to a context whose origin does not match the pattern.
pub trait MessagePort: Send + Sync {
    fn post(&self, payload: &str, target_origin: &str);
}

/// A raw message handed to listeners by the shared transport.
///
/// `origin` identifies the sending context and is the session's trust
/// boundary; `data` is an opaque string until the protocol layer decodes
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub data: String,
    pub origin: String,
}

/// Identifies one attached transport listener, for later detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A callback invoked for every raw message the ambient context receives.
pub type MessageListener = Arc<dyn Fn(&InboundMessage) + Send + Sync + 'static>;

/// A platform handle that may or may not be directly postable.
#[derive(Clone)]
pub enum Handle {
    /// A directly postable context.
    Port(Arc<dyn MessagePort>),
    /// An embeddable frame, postable through its content context once one
    /// exists.
    Frame {
        content: Option<Arc<dyn MessagePort>>,
    },
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Port(_) => f.write_str("Handle::Port"),
            Handle::Frame { content } => f
                .debug_struct("Handle::Frame")
                .field("content", &content.is_some())
                .finish(),
        }
    }
}

/// The enclosing execution context.
///
/// All methods degrade rather than fail: a context without a parent, a
/// key that resolves to nothing, or a missing listener capability all
/// yield `None`, and callers treat that as "endpoint/session unavailable"
/// rather than an error.
pub trait AmbientContext: Send + Sync {
    /// The parent context's port, if this context is embedded in one.
    fn parent(&self) -> Option<Arc<dyn MessagePort>>;

    /// Resolve a lookup key to a platform handle.
    fn lookup(&self, key: &str) -> Option<Handle>;

    /// Attach a listener for raw inbound messages. Returns `None` when
    /// the context has no listener capability (e.g. a headless
    /// environment) — sessions are constructed speculatively in such
    /// environments and must degrade, not panic.
    fn attach_listener(&self, listener: MessageListener) -> Option<ListenerId>;

    /// Detach a previously attached listener. Unknown ids are ignored.
    fn detach_listener(&self, id: ListenerId);
}
