use std::time::Duration;

use avaluos_core::FilterState;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::query::{DocumentQuery, QueryEvent};

/// Keeps the current filter's result set fresh.
///
/// Refetches on start, every `interval`, whenever the filters change and
/// whenever the current key is invalidated. Stops when the filter sender is
/// dropped or the handle is aborted.
pub struct RefreshTask {
    query: DocumentQuery,
    filters: watch::Receiver<FilterState>,
    interval: Duration,
}

impl RefreshTask {
    pub fn new(
        query: DocumentQuery,
        filters: watch::Receiver<FilterState>,
        interval: Duration,
    ) -> Self {
        Self {
            query,
            filters,
            interval,
        }
    }

    /// Spawn the refresh loop
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut current = self.filters.borrow_and_update().clone();
        let mut events = self.query.subscribe(&current);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Starting periodic refresh"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Scheduled refresh");
                }
                changed = self.filters.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    current = self.filters.borrow_and_update().clone();
                    events = self.query.subscribe(&current);
                    ticker.reset();
                    tracing::debug!("Filters changed");
                }
                event = events.recv() => match event {
                    Ok(QueryEvent::Invalidated) | Err(RecvError::Lagged(_)) => {
                        tracing::debug!("Query invalidated");
                    }
                    Ok(QueryEvent::Updated) => continue,
                    Err(RecvError::Closed) => {
                        events = self.query.subscribe(&current);
                        continue;
                    }
                },
            }

            if let Err(e) = self.query.fetch(&current).await {
                tracing::warn!(error = %e, "Refresh failed; keeping previous rows");
            }
        }

        tracing::info!("Periodic refresh stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{avaluo, MockAvaluoStore};
    use std::sync::Arc;

    async fn wait_for_updates(
        events: &mut tokio::sync::broadcast::Receiver<QueryEvent>,
        count: usize,
    ) {
        let mut seen = 0;
        while seen < count {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("timed out waiting for refresh")
                .unwrap();
            if event == QueryEvent::Updated {
                seen += 1;
            }
        }
    }

    #[tokio::test]
    async fn test_fetches_on_start_and_on_invalidation() {
        let store = MockAvaluoStore::new();
        store.add(avaluo(1, Some("A"), None));
        let query = DocumentQuery::new(Arc::new(store.clone()));

        let filters = FilterState::default();
        let (_tx, rx) = watch::channel(filters.clone());
        let mut events = query.subscribe(&filters);

        let handle = RefreshTask::new(query.clone(), rx, Duration::from_secs(3600)).start();
        wait_for_updates(&mut events, 1).await;
        assert_eq!(store.query_count(), 1);

        query.invalidate_all();
        wait_for_updates(&mut events, 1).await;
        assert_eq!(store.query_count(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_fetches_on_filter_change() {
        let store = MockAvaluoStore::new();
        let query = DocumentQuery::new(Arc::new(store.clone()));

        let (tx, rx) = watch::channel(FilterState::default());
        let handle = RefreshTask::new(query.clone(), rx, Duration::from_secs(3600)).start();

        let closed = FilterState {
            show_closed: true,
            ..FilterState::default()
        };
        let mut events = query.subscribe(&closed);
        tx.send(closed.clone()).unwrap();
        wait_for_updates(&mut events, 1).await;
        assert!(query.cached(&closed).is_some());

        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("refresh task did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetches_on_interval() {
        let store = MockAvaluoStore::new();
        let query = DocumentQuery::new(Arc::new(store.clone()));
        let filters = FilterState::default();
        let (_tx, rx) = watch::channel(filters.clone());
        let mut events = query.subscribe(&filters);

        let handle = RefreshTask::new(query, rx, Duration::from_millis(50)).start();
        wait_for_updates(&mut events, 3).await;
        assert!(store.query_count() >= 3);

        handle.abort();
    }
}
