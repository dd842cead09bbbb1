//! Directory enumeration session state.
//!
//! ProjFS identifies each enumeration session by an opaque GUID and spreads
//! one logical listing over many `Get` callbacks. Sessions are tracked here
//! as cursor state over a fetched entry snapshot. A single condition
//! variable is shared across all sessions; it signals whenever any session
//! stops loading so concurrent callbacks for the same directory can re-check.

use std::collections::HashMap;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::types::FileInfo;

/// Ceiling on `Get` callbacks for one session. Exceeding it returns empty
/// batches to break suspected kernel feedback loops.
pub const MAX_CALLS_PER_ENUM: u32 = 100;

/// Opaque 128-bit enumeration identifier, stable across one session's
/// `Start`/`Get`/`End` callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnumerationId(pub u128);

#[cfg(windows)]
impl From<&windows::core::GUID> for EnumerationId {
    fn from(guid: &windows::core::GUID) -> Self {
        let mut bytes: [u8; 16] = [0; 16];
        bytes[..4].copy_from_slice(&guid.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&guid.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&guid.data3.to_le_bytes());
        bytes[8..].copy_from_slice(&guid.data4);
        Self(u128::from_le_bytes(bytes))
    }
}

/// Cursor state for one enumeration session.
#[derive(Debug, Default)]
pub struct EnumerationState {
    /// Fetched entry snapshot.
    pub entries: Vec<FileInfo>,
    /// Next entry to hand to the kernel. Invariant: `<= entries.len()`.
    pub next_index: usize,
    /// A callback is currently fetching entries for this session.
    pub is_loading: bool,
    /// The fetch finished; `entries` will not be replaced except by restart.
    pub is_complete: bool,
    /// `Get` callbacks observed for this session.
    pub call_count: u32,
}

impl EnumerationState {
    /// Reset to a fresh state, as on `RESTART_SCAN`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the cursor still points at an entry.
    pub fn has_remaining(&self) -> bool {
        self.next_index < self.entries.len()
    }
}

/// All live enumeration sessions, keyed by identifier.
pub struct EnumerationTable {
    states: Mutex<HashMap<EnumerationId, EnumerationState>>,
    loaded: Condvar,
}

impl EnumerationTable {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            loaded: Condvar::new(),
        }
    }

    /// Lock the session map. Callers drive the populate/process phases
    /// directly on the guard and must drop it before any outbound call.
    pub fn lock(&self) -> MutexGuard<'_, HashMap<EnumerationId, EnumerationState>> {
        self.states.lock()
    }

    /// Insert a fresh session, returning true when an existing one was
    /// overwritten (kernel-side identifier reuse).
    pub fn insert_fresh(&self, id: EnumerationId) -> bool {
        self.states
            .lock()
            .insert(id, EnumerationState::default())
            .is_some()
    }

    /// Remove a session. Returns true when it existed.
    pub fn remove(&self, id: EnumerationId) -> bool {
        self.states.lock().remove(&id).is_some()
    }

    /// Block until the given session is no longer loading.
    pub fn wait_until_loaded(
        &self,
        guard: &mut MutexGuard<'_, HashMap<EnumerationId, EnumerationState>>,
        id: EnumerationId,
    ) {
        while guard.get(&id).map(|s| s.is_loading).unwrap_or(false) {
            self.loaded.wait(guard);
        }
    }

    /// Wake every waiter.
    pub fn notify_all(&self) {
        self.loaded.notify_all();
    }

    /// A directory listing landed in the cache: clear the loading flag on
    /// every loading session and wake all waiters so they re-check.
    pub fn mark_listing_ready(&self, path: &str) {
        let mut states = self.states.lock();
        for state in states.values_mut() {
            if state.is_loading {
                state.is_loading = false;
            }
        }
        drop(states);

        tracing::debug!("directory listing ready for {}", path);
        self.loaded.notify_all();
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

impl Default for EnumerationTable {
    fn default() -> Self {
        Self::new()
    }
}
