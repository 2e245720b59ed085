//! Endpoint configuration and resolution.
//!
//! An endpoint is one resolved communication target plus its origin
//! filter pair: `from` (the origin the session accepts inbound traffic
//! from on this endpoint's behalf) and `to` (the origin pattern outbound
//! posts are scoped by). Configuration accepts a closed set of target
//! specs; resolution unwraps them to a concrete postable port or degrades
//! to `None` with a warning — a misconfigured endpoint is skipped, never
//! fatal.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::context::{AmbientContext, Handle, MessagePort};
use crate::origin::WILDCARD;

/// What an endpoint configuration points at.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    /// The enclosing context's parent (the default).
    Parent,
    /// A key resolved through the ambient context's lookup capability.
    Key(String),
    /// A handle already in hand.
    Handle(Handle),
    /// A wrapped element collection; the first underlying handle is used.
    Wrapped(Vec<Handle>),
}

impl TargetSpec {
    fn describe(&self) -> String {
        match self {
            TargetSpec::Parent => "parent".to_string(),
            TargetSpec::Key(key) => format!("key {key:?}"),
            TargetSpec::Handle(_) => "handle".to_string(),
            TargetSpec::Wrapped(handles) => format!("wrapped ({} handles)", handles.len()),
        }
    }
}

/// One endpoint configuration: a target spec plus origin patterns.
///
/// Both patterns default to the wildcard; `from` widens the session's
/// accepted-origin set, `to` scopes where outbound posts may land.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub target: TargetSpec,
    pub from: String,
    pub to: String,
}

impl EndpointConfig {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            from: WILDCARD.to_string(),
            to: WILDCARD.to_string(),
        }
    }

    /// Target the enclosing context's parent.
    pub fn parent() -> Self {
        Self::new(TargetSpec::Parent)
    }

    /// Target whatever `key` resolves to via the ambient lookup.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new(TargetSpec::Key(key.into()))
    }

    /// Target a port already in hand.
    pub fn port(port: Arc<dyn MessagePort>) -> Self {
        Self::new(TargetSpec::Handle(Handle::Port(port)))
    }

    /// Accept inbound traffic from this origin (instead of any).
    pub fn from(mut self, origin: impl Into<String>) -> Self {
        self.from = origin.into();
        self
    }

    /// Scope outbound posts to this target origin (instead of any).
    pub fn to(mut self, origin: impl Into<String>) -> Self {
        self.to = origin.into();
        self
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::parent()
    }
}

/// One resolved, immutable communication target.
#[derive(Clone)]
pub struct Endpoint {
    target: Arc<dyn MessagePort>,
    from: String,
    to: String,
}

impl Endpoint {
    /// Resolve `config` against the ambient context.
    ///
    /// Returns `None` after a warning-level diagnostic when no postable
    /// target can be found — callers must check before use. Never panics.
    pub fn resolve(context: &dyn AmbientContext, config: EndpointConfig) -> Option<Endpoint> {
        let EndpointConfig { target, from, to } = config;
        let described = target.describe();

        let handle = match target {
            TargetSpec::Parent => context.parent().map(Handle::Port),
            TargetSpec::Key(key) => context.lookup(&key),
            TargetSpec::Handle(handle) => Some(handle),
            TargetSpec::Wrapped(handles) => handles.into_iter().next(),
        };

        let port = match handle {
            Some(Handle::Port(port)) => Some(port),
            Some(Handle::Frame { content }) => content,
            None => None,
        };

        match port {
            Some(target) => Some(Endpoint { target, from, to }),
            None => {
                warn!(target = %described, "could not establish a postable endpoint target");
                None
            }
        }
    }

    pub fn target(&self) -> &Arc<dyn MessagePort> {
        &self.target
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    /// Whether this endpoint addresses the same logical `(from, to)` pair.
    pub(crate) fn same_pair(&self, other: &Endpoint) -> bool {
        self.from == other.from && self.to == other.to
    }

    /// Whether this endpoint posts to the identical target.
    pub(crate) fn same_target(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
