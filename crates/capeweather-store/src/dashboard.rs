//! Fetch lifecycle: pending → provider call → fulfilled/rejected.
//!
//! Provider failures stop here and become the store's error status; they are
//! never returned to the caller. Only rejected input is.

use std::future::Future;
use std::sync::Arc;

use capeweather_core::{ProviderError, ValidationError};
use capeweather_provider::{coords_query, LocationRecord, WeatherSource};
use tokio::task::JoinHandle;

use crate::state::{request_key, Action, RegionGate, RequestId};
use crate::store::WeatherStore;

/// How a dispatched fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was merged into the store.
    Applied,
    /// The provider failed; the message is now the store's error.
    Rejected(String),
    /// A newer request for the same location finished first, or the list
    /// was cleared while this one was in flight.
    Superseded,
}

/// A store driven by a weather source.
pub struct Dashboard<S> {
    store: WeatherStore,
    source: Arc<S>,
}

impl<S> Clone for Dashboard<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S> std::fmt::Debug for Dashboard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: WeatherSource + 'static> Dashboard<S> {
    pub fn new(source: S, gate: RegionGate) -> Self {
        Self::with_store(WeatherStore::new(gate), Arc::new(source))
    }

    pub fn with_store(store: WeatherStore, source: Arc<S>) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    /// Fetch current conditions for a search query.
    ///
    /// Blank queries are rejected without touching the store.
    pub async fn request_fetch(&self, query: &str) -> Result<FetchOutcome, ValidationError> {
        let query = non_blank(query)?;
        let source = Arc::clone(&self.source);
        Ok(self
            .run_single(request_key(query), async move { source.fetch_one(query).await })
            .await)
    }

    pub async fn request_fetch_by_coords(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<FetchOutcome, ValidationError> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(ValidationError::InvalidCoordinates { lat, lon });
        }
        let source = Arc::clone(&self.source);
        Ok(self
            .run_single(request_key(&coords_query(lat, lon)), async move {
                source.fetch_one_by_coords(lat, lon).await
            })
            .await)
    }

    /// Like [`Self::request_fetch`], with an hourly forecast attached.
    pub async fn request_fetch_with_forecast(
        &self,
        query: &str,
        days: u8,
    ) -> Result<FetchOutcome, ValidationError> {
        let query = non_blank(query)?;
        let source = Arc::clone(&self.source);
        Ok(self
            .run_single(request_key(query), async move {
                source.fetch_forecast(query, days).await
            })
            .await)
    }

    /// Fetch several locations at once, adding only names not already listed.
    ///
    /// Blank entries are dropped. The store's status is only touched if the
    /// batch fails.
    pub async fn request_fetch_bulk(
        &self,
        queries: &[String],
    ) -> Result<FetchOutcome, ValidationError> {
        let queries: Vec<String> = queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect();
        if queries.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        tracing::info!("Bulk fetching {} locations", queries.len());
        let generation = self.store.read(|s| s.generation());
        match self.source.fetch_many(&queries).await {
            Ok(records) => {
                if self.store.dispatch(Action::BulkFulfilled {
                    generation,
                    records,
                }) {
                    Ok(FetchOutcome::Applied)
                } else {
                    Ok(FetchOutcome::Superseded)
                }
            }
            Err(e) => {
                tracing::error!("Bulk fetch failed: {}", e);
                let message = e.message();
                if self.store.dispatch(Action::BulkRejected {
                    generation,
                    message: message.clone(),
                }) {
                    Ok(FetchOutcome::Rejected(message))
                } else {
                    Ok(FetchOutcome::Superseded)
                }
            }
        }
    }

    /// Seed the list with the given default suburbs.
    pub async fn seed_defaults(&self, suburbs: &[String]) -> Result<FetchOutcome, ValidationError> {
        self.request_fetch_bulk(suburbs).await
    }

    pub fn remove_by_name(&self, name: &str) {
        self.store.dispatch(Action::RemoveByName {
            name: name.to_string(),
        });
    }

    pub fn clear_all(&self) {
        self.store.dispatch(Action::ClearAll);
    }

    /// Run [`Self::request_fetch`] in the background; the UI keeps going and
    /// picks up the result through [`WeatherStore::subscribe`].
    pub fn spawn_fetch(&self, query: String) -> JoinHandle<Result<FetchOutcome, ValidationError>> {
        let dashboard = self.clone();
        tokio::spawn(async move { dashboard.request_fetch(&query).await })
    }

    async fn run_single<F>(&self, key: String, fetch: F) -> FetchOutcome
    where
        F: Future<Output = Result<LocationRecord, ProviderError>>,
    {
        let id = self.store.next_request_id();
        self.store.dispatch(Action::FetchPending {
            id,
            key: key.clone(),
        });
        let guard = PendingGuard {
            store: &self.store,
            id,
            key: Some(key),
        };

        let result = fetch.await;
        let key = guard.disarm();
        match result {
            Ok(record) => {
                tracing::info!(
                    "Fetched {}: {}°C, {}",
                    record.name,
                    record.current.temperature_c,
                    record.current.condition_text
                );
                if self
                    .store
                    .dispatch(Action::FetchFulfilled { id, key, record })
                {
                    FetchOutcome::Applied
                } else {
                    FetchOutcome::Superseded
                }
            }
            Err(e) => {
                tracing::error!("Failed to fetch weather for {:?}: {}", key, e);
                let message = e.message();
                if self.store.dispatch(Action::FetchRejected {
                    id,
                    key,
                    message: message.clone(),
                }) {
                    FetchOutcome::Rejected(message)
                } else {
                    FetchOutcome::Superseded
                }
            }
        }
    }
}

/// Settles a pending request whose future is dropped before the provider
/// answers, so the store does not stay `Loading`.
struct PendingGuard<'a> {
    store: &'a WeatherStore,
    id: RequestId,
    key: Option<String>,
}

impl PendingGuard<'_> {
    fn disarm(mut self) -> String {
        self.key.take().unwrap_or_default()
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.store.dispatch(Action::FetchAbandoned { id: self.id, key });
        }
    }
}

fn non_blank(query: &str) -> Result<&str, ValidationError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        tracing::debug!("Ignoring blank search query");
        return Err(ValidationError::EmptyQuery);
    }
    Ok(trimmed)
}
