//! Topic-per-league observer registry.
//!
//! Every observer owns a bounded outbox. Publishing never waits on an
//! observer: a full outbox drops the notice for that observer only, and a
//! closed outbox gets its observer pruned from every topic. Nothing is
//! buffered for observers that connect later; they re-fetch on (re)connect.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use draftpool_core::notice::{DraftNotice, DraftNotifier};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use uuid::Uuid;

/// Identifies one connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Outcome of publishing one notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Observers whose outbox accepted the notice.
    pub delivered: usize,
    /// Observers whose outbox was full.
    pub dropped: usize,
    /// Observers found disconnected and removed.
    pub pruned: usize,
}

#[derive(Debug, Default)]
struct Registry {
    observers: HashMap<ObserverId, mpsc::Sender<DraftNotice>>,
    topics: HashMap<Uuid, HashSet<ObserverId>>,
}

impl Registry {
    fn remove_observer(&mut self, observer: ObserverId) -> bool {
        let existed = self.observers.remove(&observer).is_some();
        self.topics.retain(|_, members| {
            members.remove(&observer);
            !members.is_empty()
        });
        existed
    }
}

/// League-scoped pub/sub hub for draft notices.
#[derive(Debug)]
pub struct LeagueTopics {
    outbox_capacity: usize,
    next_id: AtomicU64,
    registry: RwLock<Registry>,
}

impl LeagueTopics {
    /// Creates a hub whose observers each buffer up to `outbox_capacity`
    /// notices (at least one).
    #[must_use]
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            outbox_capacity: outbox_capacity.max(1),
            next_id: AtomicU64::new(1),
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Registers a new observer and returns its id and outbox.
    pub fn connect(&self) -> (ObserverId, mpsc::Receiver<DraftNotice>) {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .insert(id, tx);
        debug!(%id, "observer connected");
        (id, rx)
    }

    /// Subscribes an observer to a league. Returns `false` if the observer is
    /// not connected.
    pub fn join(&self, observer: ObserverId, league_id: Uuid) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if !registry.observers.contains_key(&observer) {
            return false;
        }
        registry.topics.entry(league_id).or_default().insert(observer);
        debug!(%observer, %league_id, "observer joined league topic");
        true
    }

    /// Unsubscribes an observer from a league. Returns whether it was
    /// subscribed.
    pub fn leave(&self, observer: ObserverId, league_id: Uuid) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let Some(members) = registry.topics.get_mut(&league_id) else {
            return false;
        };
        let removed = members.remove(&observer);
        if members.is_empty() {
            registry.topics.remove(&league_id);
        }
        removed
    }

    /// Removes an observer and all of its subscriptions.
    pub fn disconnect(&self, observer: ObserverId) {
        let existed = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_observer(observer);
        if existed {
            debug!(%observer, "observer disconnected");
        }
    }

    /// Number of observers subscribed to a league.
    #[must_use]
    pub fn subscriber_count(&self, league_id: Uuid) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .topics
            .get(&league_id)
            .map_or(0, HashSet::len)
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }

    /// Offers a notice to every observer subscribed to its league.
    pub fn publish(&self, notice: &DraftNotice) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();

        {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            let Some(members) = registry.topics.get(&notice.league_id) else {
                debug!(league_id = %notice.league_id, "no observers for league");
                return report;
            };
            for id in members {
                let Some(outbox) = registry.observers.get(id) else {
                    continue;
                };
                match outbox.try_send(notice.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => report.dropped += 1,
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            for id in closed {
                if registry.remove_observer(id) {
                    report.pruned += 1;
                    info!(observer = %id, "pruned disconnected observer");
                }
            }
        }

        debug!(
            league_id = %notice.league_id,
            update_type = notice.kind.as_str(),
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "draft notice published"
        );
        report
    }
}

impl DraftNotifier for LeagueTopics {
    fn draft_changed(&self, notice: DraftNotice) {
        self.publish(&notice);
    }
}
