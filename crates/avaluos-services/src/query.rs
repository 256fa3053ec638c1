//! Cached query layer over the records table.
//!
//! One cache entry per [`FilterState`]. Every fetch stamps its entry with a
//! fresh generation number, unique across keys and evictions; a response is
//! applied only if its generation is still current when it arrives, so a slow
//! response can never overwrite a newer one. Invalidation also advances the
//! generation, which discards responses that were in flight before the write
//! that caused it.
//!
//! Subscribers receive [`QueryEvent`]s per key over a broadcast channel. An
//! invalidated key nobody subscribes to is evicted; the next `get` refetches it.

use avaluos_core::{AppError, Avaluo, ErrorMetadata, FilterState};
use avaluos_db::AvaluoStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Change notification for one cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEvent {
    /// A fetch was applied; new rows are readable
    Updated,
    /// Cached rows are stale and should be refetched
    Invalidated,
}

/// Result of a single fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Applied(Arc<Vec<Avaluo>>),
    /// A newer fetch or an invalidation happened while this one was in flight
    Superseded,
}

/// Snapshot of a cache entry
#[derive(Debug, Clone, Default)]
pub struct CachedResult {
    /// Last successfully fetched rows; kept across failed fetches
    pub data: Option<Arc<Vec<Avaluo>>>,
    pub stale: bool,
    /// Message of the most recent failed fetch, cleared by the next success
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct Entry {
    data: Option<Arc<Vec<Avaluo>>>,
    stale: bool,
    last_error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    generation: u64,
    events: broadcast::Sender<QueryEvent>,
}

impl Entry {
    fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            data: None,
            stale: false,
            last_error: None,
            updated_at: None,
            generation: 0,
            events,
        }
    }

    fn snapshot(&self) -> CachedResult {
        CachedResult {
            data: self.data.clone(),
            stale: self.stale,
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }

    fn invalidate(&mut self, generation: u64) {
        self.stale = true;
        self.generation = generation;
        let _ = self.events.send(QueryEvent::Invalidated);
    }

    fn is_observed(&self) -> bool {
        self.events.receiver_count() > 0
    }
}

/// Filtered, cached view of the records table
#[derive(Clone)]
pub struct DocumentQuery {
    store: Arc<dyn AvaluoStore>,
    entries: Arc<Mutex<HashMap<FilterState, Entry>>>,
    generations: Arc<AtomicU64>,
}

impl DocumentQuery {
    pub fn new(store: Arc<dyn AvaluoStore>) -> Self {
        Self {
            store,
            entries: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<FilterState, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the query for `filters` and apply the result if still current.
    ///
    /// Failures are returned as `AppError::Query`; the entry keeps its previous
    /// rows and records the error message.
    pub async fn fetch(&self, filters: &FilterState) -> Result<FetchOutcome, AppError> {
        let generation = self.next_generation();
        self.entries()
            .entry(filters.clone())
            .or_insert_with(Entry::new)
            .generation = generation;

        let result = self.store.query(&filters.to_query()).await;

        let mut entries = self.entries();
        let entry = match entries.get_mut(filters) {
            Some(entry) if entry.generation == generation => entry,
            current => {
                tracing::debug!(
                    generation,
                    current = ?current.map(|e| e.generation),
                    "Dropping superseded query response"
                );
                return Ok(FetchOutcome::Superseded);
            }
        };

        match result {
            Ok(rows) => {
                let rows = Arc::new(rows);
                entry.data = Some(rows.clone());
                entry.stale = false;
                entry.last_error = None;
                entry.updated_at = Some(Utc::now());
                let _ = entry.events.send(QueryEvent::Updated);

                tracing::debug!(generation, count = rows.len(), "Query result applied");
                Ok(FetchOutcome::Applied(rows))
            }
            Err(e) => {
                let err = match e {
                    AppError::Query(_) => e,
                    other => AppError::Query(other.to_string()),
                };
                entry.last_error = Some(err.client_message());

                tracing::error!(error = %err, generation, "Query failed");
                Err(err)
            }
        }
    }

    /// Cached rows when fresh, otherwise a fetch.
    ///
    /// If the fetch is superseded the newest available rows are returned; the
    /// newer fetch publishes its own result to subscribers.
    pub async fn get(&self, filters: &FilterState) -> Result<Arc<Vec<Avaluo>>, AppError> {
        if let Some(cached) = self.cached(filters) {
            if let (Some(data), false) = (cached.data, cached.stale) {
                return Ok(data);
            }
        }

        match self.fetch(filters).await? {
            FetchOutcome::Applied(rows) => Ok(rows),
            FetchOutcome::Superseded => Ok(self
                .cached(filters)
                .and_then(|c| c.data)
                .unwrap_or_default()),
        }
    }

    pub fn cached(&self, filters: &FilterState) -> Option<CachedResult> {
        self.entries().get(filters).map(Entry::snapshot)
    }

    /// Mark one key stale and notify its subscribers
    pub fn invalidate(&self, filters: &FilterState) {
        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(filters) {
            entry.invalidate(self.next_generation());
            if !entry.is_observed() {
                entries.remove(filters);
            }
        }
    }

    /// Mark every key stale and notify all subscribers
    pub fn invalidate_all(&self) {
        let mut entries = self.entries();
        for entry in entries.values_mut() {
            entry.invalidate(self.next_generation());
        }
        let before = entries.len();
        entries.retain(|_, entry| entry.is_observed());
        tracing::debug!(
            keys = entries.len(),
            evicted = before - entries.len(),
            "Invalidated all cached queries"
        );
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn subscribe(&self, filters: &FilterState) -> broadcast::Receiver<QueryEvent> {
        self.entries()
            .entry(filters.clone())
            .or_insert_with(Entry::new)
            .events
            .subscribe()
    }
}
