//! Stable emitter identifiers
//!
//! Identity survives save/load: an emitter file stores its id verbatim,
//! and loading bumps the process-wide counter past it so freshly
//! created emitters can never collide with loaded ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier the host uses to refer to an engine instance it owns.
///
/// There is no ambient registry mapping ids back to live instances;
/// ownership of the engine stays with the host.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmitterId(pub u64);

impl EmitterId {
    /// Allocate the next unused id
    pub fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a stored id from an emitter file. Callers loading files
    /// should also call [`EmitterId::ensure_counter_above`].
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Advance the allocation counter past `value` so ids restored
    /// from persistence cannot be handed out again by `new()`.
    pub fn ensure_counter_above(value: u64) {
        let mut current = NEXT_ID.load(Ordering::Relaxed);
        while current <= value {
            match NEXT_ID.compare_exchange_weak(
                current,
                value + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(c) => current = c,
            }
        }
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmitterId({})", self.0)
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn freshly_allocated_ids_never_repeat() {
        let ids: Vec<EmitterId> = (0..8).map(|_| EmitterId::new()).collect();
        for pair in ids.windows(2) {
            assert!(pair[1].raw() > pair[0].raw());
        }
    }

    #[test]
    fn loaded_id_round_trips_and_keys_host_maps() {
        let id = EmitterId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id, EmitterId::from_raw(42));

        // The host keys its engine handles by id
        let mut owned: HashMap<EmitterId, &str> = HashMap::new();
        owned.insert(id, "sparks");
        assert_eq!(owned.get(&EmitterId::from_raw(42)), Some(&"sparks"));
    }

    #[test]
    fn counter_skips_past_restored_ids() {
        EmitterId::ensure_counter_above(5_000);
        assert!(EmitterId::new().raw() > 5_000);
        // A lower stored id never moves the counter backwards
        EmitterId::ensure_counter_above(10);
        assert!(EmitterId::new().raw() > 5_000);
    }

    #[test]
    fn display_is_the_bare_number() {
        let id = EmitterId::from_raw(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(format!("{id:?}"), "EmitterId(7)");
    }
}
