//! Cross-context event sessions for gangway.
//!
//! This crate turns a raw, unordered, string-only cross-context transport
//! into a structured, named-event protocol, multiplexed across one or
//! more independently configured endpoints and filtered by trusted
//! origin on the way in.
//!
//! Key modules:
//! - [`protocol`] — the flat JSON wire envelope and its decode taxonomy
//! - [`context`] — the capability traits the session consumes
//!   (message ports, lookup, listener attach/detach)
//! - [`endpoint`] — endpoint configuration and resolution
//! - [`origin`] — the accepted-origin security boundary
//! - [`session`] — the multiplexed send/receive channel itself
//! - [`link`] — in-process panes for tests and same-process embedding
//! - [`registry`] — optional process-wide bindings with no-conflict
//!   restore

pub mod context;
pub mod endpoint;
pub mod link;
pub mod origin;
pub mod protocol;
pub mod registry;
pub mod session;

pub use gw_bus::{callback, Callback, Context, EventBus, ALL};

pub use context::{
    AmbientContext, Handle, InboundMessage, ListenerId, MessageListener, MessagePort,
};
pub use endpoint::{Endpoint, EndpointConfig, TargetSpec};
pub use origin::{OriginSet, WILDCARD};
pub use protocol::{decode, encode, DecodeError, Envelope};
pub use session::{Session, SessionStats};
