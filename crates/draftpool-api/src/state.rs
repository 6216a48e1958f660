//! Shared application state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use draftpool_broadcast::LeagueTopics;
use draftpool_core::clock::Clock;
use draftpool_core::notice::DraftNotifier;
use draftpool_core::repository::{DraftRepository, ItemCatalog};
use draftpool_core::rng::DeterministicRng;
use sqlx::PgPool;

/// Default period of the WebSocket `resync` hint.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted `resync` period.
pub const MIN_RESYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Clock for timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for draft order shuffles.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Authoritative draft state.
    pub draft_repository: Arc<dyn DraftRepository>,
    /// Catalog of draftable items.
    pub item_catalog: Arc<dyn ItemCatalog>,
    /// Observers connected to this worker.
    pub topics: Arc<LeagueTopics>,
    /// Where command handlers send notices. Defaults to `topics`; a
    /// multi-worker deployment routes through the database instead.
    pub notifier: Arc<dyn DraftNotifier>,
    /// Period of the WebSocket `resync` hint.
    pub resync_interval: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        draft_repository: Arc<dyn DraftRepository>,
        item_catalog: Arc<dyn ItemCatalog>,
        topics: Arc<LeagueTopics>,
    ) -> Self {
        let notifier = Arc::clone(&topics) as Arc<dyn DraftNotifier>;
        Self {
            db_pool,
            clock,
            rng,
            draft_repository,
            item_catalog,
            topics,
            notifier,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
        }
    }

    /// Replaces the notifier handed to command handlers.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn DraftNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Overrides the WebSocket `resync` period, raised to at least
    /// [`MIN_RESYNC_INTERVAL`].
    #[must_use]
    pub fn with_resync_interval(mut self, resync_interval: Duration) -> Self {
        self.resync_interval = resync_interval.max(MIN_RESYNC_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use draftpool_test_support::{
        FixedClock, InMemoryDraftRepository, MockRng, StaticItemCatalog,
    };

    use super::*;

    fn state() -> AppState {
        let pool = PgPool::connect_lazy("postgres://localhost/test").unwrap();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(chrono::Utc::now()));
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
        AppState::new(
            pool,
            clock,
            rng,
            Arc::new(InMemoryDraftRepository::new()),
            Arc::new(StaticItemCatalog::new(1..=5)),
            Arc::new(LeagueTopics::new(4)),
        )
    }

    #[tokio::test]
    async fn test_zero_resync_interval_is_raised_to_minimum() {
        let state = state().with_resync_interval(Duration::ZERO);

        assert_eq!(state.resync_interval, MIN_RESYNC_INTERVAL);
    }

    #[tokio::test]
    async fn test_resync_interval_above_minimum_is_kept() {
        let state = state().with_resync_interval(Duration::from_secs(5));

        assert_eq!(state.resync_interval, Duration::from_secs(5));
    }
}
