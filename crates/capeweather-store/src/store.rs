//! Shared handle to the dashboard state.
//!
//! `WeatherStore` owns the state behind a lock and is the single mutation
//! path: callers dispatch [`Action`]s, the reducer applies them, and every
//! applied change is broadcast to subscribers as a new version number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::state::{Action, RegionGate, RequestId, WeatherState};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

struct StoreShared {
    state: RwLock<WeatherState>,
    gate: RegionGate,
    next_request_id: AtomicU64,
    version: AtomicU64,
    changes: broadcast::Sender<u64>,
}

/// Cloneable handle; all clones share one state.
#[derive(Clone)]
pub struct WeatherStore {
    shared: Arc<StoreShared>,
}

impl std::fmt::Debug for WeatherStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherStore")
            .field("gate", &self.shared.gate)
            .field("version", &self.version())
            .finish()
    }
}

impl WeatherStore {
    pub fn new(gate: RegionGate) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(StoreShared {
                state: RwLock::new(WeatherState::new()),
                gate,
                next_request_id: AtomicU64::new(0),
                version: AtomicU64::new(0),
                changes,
            }),
        }
    }

    pub fn gate(&self) -> &RegionGate {
        &self.shared.gate
    }

    /// Allocate the next request id. Ids start at 1 and never repeat.
    pub fn next_request_id(&self) -> RequestId {
        self.shared.next_request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply an action. Returns false if the reducer discarded it.
    pub fn dispatch(&self, action: Action) -> bool {
        let applied = {
            let mut state = self.shared.state.write();
            state.apply(action, &self.shared.gate)
        };

        if applied {
            let version = self.shared.version.fetch_add(1, Ordering::SeqCst) + 1;
            // No subscribers is fine.
            let _ = self.shared.changes.send(version);
        }
        applied
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&WeatherState) -> R) -> R {
        f(&self.shared.state.read())
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> WeatherState {
        self.shared.state.read().clone()
    }

    /// Number of applied actions so far.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::SeqCst)
    }

    /// Receive the version number after each applied action.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.shared.changes.subscribe()
    }
}

impl Default for WeatherStore {
    fn default() -> Self {
        Self::new(RegionGate::open())
    }
}
