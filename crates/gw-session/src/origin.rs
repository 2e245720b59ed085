//! Accepted-origin filtering for inbound traffic.
//!
//! A session shares its transport with unrelated code, so every inbound
//! message carries the sending context's origin and is checked against
//! the set of origins the session's endpoints were configured to accept.
//! Messages from unaccepted origins are dropped silently — rejection is a
//! security control, not an error condition.

use ahash::AHashSet;

/// The accept-anything / send-to-anything origin pattern.
pub const WILDCARD: &str = "*";

/// The set of origins a session accepts inbound traffic from.
///
/// Membership is exact-string; the only pattern is [`WILDCARD`], whose
/// presence accepts every origin.
#[derive(Debug, Clone, Default)]
pub struct OriginSet {
    accepted: AHashSet<String>,
}

impl OriginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accepted origin pattern.
    pub fn insert(&mut self, pattern: impl Into<String>) {
        self.accepted.insert(pattern.into());
    }

    /// Whether a message from `origin` passes the filter.
    pub fn accepts(&self, origin: &str) -> bool {
        self.accepted.contains(WILDCARD) || self.accepted.contains(origin)
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
