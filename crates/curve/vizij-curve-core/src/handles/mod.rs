//! Stable key identities and the tables mapping them to storage positions.
//!
//! - [`KeyHandle`]: opaque, process-unique token for one keyframe.
//! - [`KeyHandleMap`]: eager bijection, renumbered on every insert/remove (used by curves).
//! - [`KeyHandleLookupTable`]: lazy variant that tolerates stale cached positions.

mod lookup;
mod map;

pub use lookup::KeyHandleLookupTable;
pub use map::KeyHandleMap;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_KEY_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Identity of a keyframe, independent of where the key is stored.
///
/// Ordering and hashing follow the raw counter only; they say nothing about key time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyHandle(u32);

impl KeyHandle {
    /// Reserved value that never names a key.
    pub const INVALID: KeyHandle = KeyHandle(0);

    /// Allocate a fresh handle. Handles are never reused within a process.
    #[inline]
    pub fn new() -> Self {
        let mut raw = NEXT_KEY_HANDLE.fetch_add(1, Ordering::Relaxed);
        if raw == 0 {
            // Counter wrapped; skip the reserved value.
            raw = NEXT_KEY_HANDLE.fetch_add(1, Ordering::Relaxed);
        }
        KeyHandle(raw)
    }

    #[inline]
    pub fn invalid() -> Self {
        Self::INVALID
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Raw counter value, as written by serialization.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        KeyHandle(raw)
    }
}

impl Default for KeyHandle {
    fn default() -> Self {
        Self::new()
    }
}
