//! Dashboard state and its reducer.
//!
//! `WeatherState` is only ever changed through [`WeatherState::apply`], one
//! [`Action`] at a time.

use std::collections::HashMap;

use capeweather_core::RegionConfig;
use capeweather_provider::LocationRecord;

/// Monotonically increasing id attached to every single-location fetch.
pub type RequestId = u64;

/// Bumped by every `ClearAll`; bulk results carry the generation they started in.
pub type Generation = u64;

/// Fetch status of the dashboard. Loading and error are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing in flight and no error to show.
    #[default]
    Idle,
    /// At least one single fetch is in flight.
    Loading,
    /// The last failure's message, kept until the next fetch starts.
    Error(String),
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Regional admission rule for the accumulated location list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionGate {
    pub restrict_to_region: bool,
    pub region_substring: String,
}

impl RegionGate {
    /// Admit every record.
    pub fn open() -> Self {
        Self::default()
    }

    /// Admit only records whose region contains `region` (case-insensitive).
    pub fn restricted(region: impl Into<String>) -> Self {
        Self {
            restrict_to_region: true,
            region_substring: region.into(),
        }
    }

    pub fn from_config(config: &RegionConfig) -> Self {
        Self {
            restrict_to_region: config.restrict_to_region,
            region_substring: config.region_substring.clone(),
        }
    }

    pub fn admits(&self, record: &LocationRecord) -> bool {
        !self.restrict_to_region || record.in_region(&self.region_substring)
    }
}

/// Normalized key used to match a fetch result to its latest request.
pub fn request_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Everything that can happen to the dashboard state.
#[derive(Debug, Clone)]
pub enum Action {
    /// A single fetch for `key` has started.
    FetchPending { id: RequestId, key: String },
    /// A single fetch succeeded.
    FetchFulfilled {
        id: RequestId,
        key: String,
        record: LocationRecord,
    },
    /// A single fetch failed with a user-facing message.
    FetchRejected {
        id: RequestId,
        key: String,
        message: String,
    },
    /// The caller stopped waiting for a single fetch before it settled.
    FetchAbandoned { id: RequestId, key: String },
    /// A bulk fetch started in `generation` succeeded.
    BulkFulfilled {
        generation: Generation,
        records: Vec<LocationRecord>,
    },
    /// A bulk fetch started in `generation` failed.
    BulkRejected {
        generation: Generation,
        message: String,
    },
    /// Drop the listed record with this name, ignoring case.
    RemoveByName { name: String },
    /// Forget everything, including requests still in flight.
    ClearAll,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    locations: Vec<LocationRecord>,
    current: Option<LocationRecord>,
    status: FetchStatus,
    pending: HashMap<String, RequestId>,
    generation: Generation,
}

impl WeatherState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated records, in insertion order. Names are unique ignoring case.
    pub fn locations(&self) -> &[LocationRecord] {
        &self.locations
    }

    /// Most recently fetched record, admitted to the list or not.
    pub fn current(&self) -> Option<&LocationRecord> {
        self.current.as_ref()
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    /// Number of single fetches still in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn find(&self, name: &str) -> Option<&LocationRecord> {
        self.locations.iter().find(|l| l.has_name(name))
    }

    /// Apply `action`. Returns false when the action was discarded because a
    /// newer request for the same key superseded it.
    pub fn apply(&mut self, action: Action, gate: &RegionGate) -> bool {
        match action {
            Action::FetchPending { id, key } => {
                self.pending.insert(key, id);
                self.status = FetchStatus::Loading;
                true
            }
            Action::FetchFulfilled { id, key, record } => {
                if !self.settle(&key, id) {
                    return false;
                }
                if gate.admits(&record) {
                    self.upsert(record.clone());
                } else {
                    tracing::debug!(
                        "{} ({}) is outside {:?}, not added to list",
                        record.name,
                        record.region,
                        gate.region_substring
                    );
                }
                self.current = Some(record);
                self.finish_loading();
                true
            }
            Action::FetchRejected { id, key, message } => {
                if !self.settle(&key, id) {
                    return false;
                }
                self.status = FetchStatus::Error(message);
                true
            }
            Action::FetchAbandoned { id, key } => {
                if !self.settle(&key, id) {
                    return false;
                }
                tracing::debug!("Fetch for {:?} abandoned (request {})", key, id);
                self.finish_loading();
                true
            }
            Action::BulkFulfilled {
                generation,
                records,
            } => {
                if !self.same_generation(generation) {
                    return false;
                }
                for record in records {
                    if gate.admits(&record) && self.find(&record.name).is_none() {
                        self.locations.push(record);
                    }
                }
                true
            }
            Action::BulkRejected {
                generation,
                message,
            } => {
                if !self.same_generation(generation) {
                    return false;
                }
                self.status = FetchStatus::Error(message);
                true
            }
            Action::RemoveByName { name } => {
                self.locations.retain(|l| !l.has_name(&name));
                true
            }
            Action::ClearAll => {
                let generation = self.generation + 1;
                *self = Self::default();
                self.generation = generation;
                true
            }
        }
    }

    /// Replace a same-named record in place, or append.
    fn upsert(&mut self, record: LocationRecord) {
        match self.locations.iter().position(|l| l.has_name(&record.name)) {
            Some(index) => self.locations[index] = record,
            None => self.locations.push(record),
        }
    }

    /// Leave `Loading` once nothing is in flight. An error stays until the
    /// next fetch starts.
    fn finish_loading(&mut self) {
        if self.status.is_loading() && self.pending.is_empty() {
            self.status = FetchStatus::Idle;
        }
    }

    fn same_generation(&self, generation: Generation) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding bulk result from before a clear (generation {} < {})",
                generation,
                self.generation
            );
            return false;
        }
        true
    }

    /// Consume the pending entry for `key` if `id` is still its latest request.
    fn settle(&mut self, key: &str, id: RequestId) -> bool {
        match self.pending.get(key) {
            Some(&latest) if latest == id => {
                self.pending.remove(key);
                true
            }
            _ => {
                tracing::debug!("Discarding superseded result for {:?} (request {})", key, id);
                false
            }
        }
    }
}
