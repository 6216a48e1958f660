//! Test repositories — in-memory `DraftRepository` and `ItemCatalog`
//! implementations for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use draftpool_core::error::{DomainError, Missing};
use draftpool_core::model::{
    CatalogItem, DraftSessionRecord, DraftSnapshot, ItemId, LeagueRecord, LeagueStatus,
    ParticipantRecord, PickRecord, SessionStatus,
};
use draftpool_core::repository::{
    DraftRepository, DraftReset, DraftStart, ItemCatalog, PickCommit,
};
use uuid::Uuid;

use crate::fixture::LeagueFixture;

#[derive(Debug, Clone)]
struct StoredLeague {
    league: LeagueRecord,
    participants: Vec<ParticipantRecord>,
    session: Option<DraftSessionRecord>,
    picks: Vec<PickRecord>,
}

fn conflict(league_id: Uuid, detail: impl Into<String>) -> DomainError {
    DomainError::ConcurrencyConflict {
        league_id,
        detail: detail.into(),
    }
}

/// A draft repository held in memory.
///
/// Every commit checks the state it was validated against under one lock and
/// rejects stale commits with `ConcurrencyConflict`, like the PostgreSQL
/// store does.
#[derive(Debug, Default)]
pub struct InMemoryDraftRepository {
    leagues: Mutex<HashMap<Uuid, StoredLeague>>,
    forced_conflicts: AtomicU32,
}

impl InMemoryDraftRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a league and its participants without any session or picks.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert_league(&self, fixture: &LeagueFixture) {
        self.leagues.lock().unwrap().insert(
            fixture.league.id,
            StoredLeague {
                league: fixture.league.clone(),
                participants: fixture.participants.clone(),
                session: None,
                picks: Vec::new(),
            },
        );
    }

    /// Makes the next `count` commits of any kind fail with
    /// `ConcurrencyConflict` without touching stored state.
    pub fn fail_next_commits(&self, count: u32) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    fn take_forced_conflict(&self, league_id: Uuid) -> Result<(), DomainError> {
        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if forced.is_ok() {
            return Err(conflict(league_id, "injected conflict"));
        }
        Ok(())
    }

    fn with_league<T>(
        &self,
        league_id: Uuid,
        f: impl FnOnce(&mut StoredLeague) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut leagues = self
            .leagues
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("store mutex poisoned: {e}")))?;
        let stored = leagues
            .get_mut(&league_id)
            .ok_or_else(|| DomainError::not_found(Missing::League, league_id))?;
        f(stored)
    }
}

#[async_trait]
impl DraftRepository for InMemoryDraftRepository {
    async fn load_snapshot(&self, league_id: Uuid) -> Result<DraftSnapshot, DomainError> {
        self.with_league(league_id, |stored| {
            let mut participants = stored.participants.clone();
            participants.sort_by_key(|p| (p.draft_position.is_none(), p.draft_position, p.joined_at));
            let mut picks = stored.picks.clone();
            picks.sort_by_key(|p| p.pick_overall);
            Ok(DraftSnapshot {
                league: stored.league.clone(),
                participants,
                session: stored.session.clone(),
                picks,
            })
        })
    }

    async fn commit_pick(&self, commit: &PickCommit) -> Result<(), DomainError> {
        let league_id = commit.pick.league_id;
        self.take_forced_conflict(league_id)?;
        self.with_league(league_id, |stored| {
            let Some(session) = stored.session.as_mut() else {
                return Err(conflict(league_id, "no draft session"));
            };
            if session.session_id != commit.session_id {
                return Err(conflict(league_id, "draft session was replaced"));
            }
            if session.status != SessionStatus::Active
                || session.current_pick_overall != commit.pick.pick_overall
            {
                return Err(conflict(
                    league_id,
                    format!(
                        "expected pick {}, session is at {}",
                        commit.pick.pick_overall, session.current_pick_overall
                    ),
                ));
            }
            if stored
                .picks
                .iter()
                .any(|p| p.item_id == commit.pick.item_id || p.pick_overall == commit.pick.pick_overall)
            {
                return Err(conflict(league_id, "duplicate pick"));
            }

            session.current_pick_overall += 1;
            if let Some(completed_at) = commit.completed_at {
                session.status = SessionStatus::Complete;
                session.completed_at = Some(completed_at);
                stored.league.status = LeagueStatus::Active;
            }
            stored.picks.push(commit.pick.clone());
            Ok(())
        })
    }

    async fn commit_start(&self, start: &DraftStart) -> Result<(), DomainError> {
        let league_id = start.session.league_id;
        self.take_forced_conflict(league_id)?;
        self.with_league(league_id, |stored| {
            if stored.league.status != LeagueStatus::PreDraft || stored.session.is_some() {
                return Err(conflict(league_id, "league is no longer pre_draft"));
            }
            let members: HashSet<Uuid> = stored.participants.iter().map(|p| p.user_id).collect();
            let ordered: HashSet<Uuid> = start.draft_order.iter().map(|s| s.user_id).collect();
            if members != ordered || start.draft_order.len() != members.len() {
                return Err(conflict(league_id, "participants changed"));
            }

            for participant in &mut stored.participants {
                participant.draft_position = start
                    .draft_order
                    .iter()
                    .find(|s| s.user_id == participant.user_id)
                    .map(|s| s.draft_position);
            }
            stored.session = Some(start.session.clone());
            stored.league.status = LeagueStatus::Drafting;
            Ok(())
        })
    }

    async fn commit_reset(&self, reset: &DraftReset) -> Result<u64, DomainError> {
        self.take_forced_conflict(reset.league_id)?;
        self.with_league(reset.league_id, |stored| {
            if stored.league.status != reset.expected_status {
                return Err(conflict(
                    reset.league_id,
                    format!("league status is {}", stored.league.status),
                ));
            }
            let removed = u64::try_from(stored.picks.len()).unwrap_or(u64::MAX);
            stored.picks.clear();
            stored.session = None;
            for participant in &mut stored.participants {
                participant.draft_position = None;
            }
            stored.league.status = LeagueStatus::PreDraft;
            Ok(removed)
        })
    }

    async fn commit_skip(&self, league_id: Uuid) -> Result<(), DomainError> {
        self.take_forced_conflict(league_id)?;
        self.with_league(league_id, |stored| {
            if stored.league.status != LeagueStatus::PreDraft || stored.session.is_some() {
                return Err(conflict(league_id, "league is no longer pre_draft"));
            }
            stored.league.status = LeagueStatus::Active;
            Ok(())
        })
    }
}

/// A draft repository that always returns an infrastructure error. Useful
/// for testing error propagation.
#[derive(Debug)]
pub struct FailingDraftRepository;

fn unavailable() -> DomainError {
    DomainError::Infrastructure("test repository failure".into())
}

#[async_trait]
impl DraftRepository for FailingDraftRepository {
    async fn load_snapshot(&self, _league_id: Uuid) -> Result<DraftSnapshot, DomainError> {
        Err(unavailable())
    }

    async fn commit_pick(&self, _commit: &PickCommit) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn commit_start(&self, _start: &DraftStart) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn commit_reset(&self, _reset: &DraftReset) -> Result<u64, DomainError> {
        Err(unavailable())
    }

    async fn commit_skip(&self, _league_id: Uuid) -> Result<(), DomainError> {
        Err(unavailable())
    }
}

/// A catalog holding a fixed set of items. Items are named `Item <id>` and
/// have no category unless set with [`StaticItemCatalog::with_item`].
#[derive(Debug, Clone, Default)]
pub struct StaticItemCatalog {
    items: HashMap<ItemId, CatalogItem>,
}

impl StaticItemCatalog {
    /// Creates a catalog containing exactly `items`.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|id| {
                    (
                        id,
                        CatalogItem {
                            id,
                            name: format!("Item {id}"),
                            category: None,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Adds or replaces one item with explicit details.
    #[must_use]
    pub fn with_item(mut self, id: ItemId, name: &str, category: Option<&str>) -> Self {
        self.items.insert(
            id,
            CatalogItem {
                id,
                name: name.to_owned(),
                category: category.map(str::to_owned),
            },
        );
        self
    }
}

#[async_trait]
impl ItemCatalog for StaticItemCatalog {
    async fn contains(&self, item_id: ItemId) -> Result<bool, DomainError> {
        Ok(self.items.contains_key(&item_id))
    }

    async fn describe(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, CatalogItem>, DomainError> {
        Ok(item_ids
            .iter()
            .filter_map(|id| self.items.get(id).map(|item| (*id, item.clone())))
            .collect())
    }
}
