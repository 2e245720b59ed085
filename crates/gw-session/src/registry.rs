//! Process-wide named bindings with no-conflict restore.
//!
//! Some embeddings still publish the messaging layer under a well-known
//! name in a shared registry. This module makes that explicit: [`bind`]
//! swaps a value into a named slot and remembers whatever occupied it,
//! and [`Binding::restore`] swaps the previous occupant back. Nothing in
//! the session core touches this registry; it exists only for embeddings
//! that need it.

use std::any::Any;
use std::sync::{Arc, Mutex, OnceLock};

use ahash::AHashMap;

/// Version of the gangway library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A value parked in the global registry.
pub type Slot = Arc<dyn Any + Send + Sync>;

fn slots() -> &'static Mutex<AHashMap<String, Slot>> {
    static SLOTS: OnceLock<Mutex<AHashMap<String, Slot>>> = OnceLock::new();
    SLOTS.get_or_init(|| Mutex::new(AHashMap::new()))
}

/// A claimed global binding.
///
/// Holds whatever previously occupied the name so [`restore`] can put it
/// back; dropping the binding without restoring leaves the new value in
/// place and forgets the previous occupant.
///
/// [`restore`]: Binding::restore
#[must_use = "dropping a Binding forgets the previous occupant"]
#[derive(Debug)]
pub struct Binding {
    name: String,
    previous: Option<Slot>,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name was already occupied when this binding claimed it.
    pub fn displaced(&self) -> bool {
        self.previous.is_some()
    }

    /// Swap the previous occupant back into the slot.
    pub fn restore(self) {
        let Binding { name, previous } = self;
        let mut slots = slots().lock().expect("registry lock poisoned");
        match previous {
            Some(previous) => {
                slots.insert(name, previous);
            }
            None => {
                slots.remove(&name);
            }
        }
    }
}

/// Claim the named slot, returning a binding that can restore the
/// previous occupant.
pub fn bind(name: impl Into<String>, value: Slot) -> Binding {
    let name = name.into();
    let previous = slots()
        .lock()
        .expect("registry lock poisoned")
        .insert(name.clone(), value);
    Binding { name, previous }
}

/// Read the current occupant of the named slot.
pub fn lookup(name: &str) -> Option<Slot> {
    slots()
        .lock()
        .expect("registry lock poisoned")
        .get(name)
        .cloned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
