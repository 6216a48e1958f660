//! Draft store and catalog abstractions.
//!
//! Reads return a [`DraftSnapshot`]; writes are compare-and-commit operations
//! that carry the state they were validated against. A store must apply each
//! commit atomically and reject it with [`DomainError::ConcurrencyConflict`]
//! when the stored state no longer matches, so that many stateless workers can
//! serve the same league without any in-process coordination.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{
    CatalogItem, DraftSessionRecord, DraftSnapshot, ItemId, LeagueStatus, PickRecord,
};

/// A validated pick, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickCommit {
    /// Session the pick was validated against.
    pub session_id: Uuid,
    /// The pick to insert. Its `pick_overall` is the session counter value the
    /// pick was validated against.
    pub pick: PickRecord,
    /// Set when this pick is the last one of the draft; the store then
    /// completes the session and activates the league in the same commit.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Draft position assigned to one participant when the draft starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSlot {
    /// The participant.
    pub user_id: Uuid,
    /// Their 1-based position in round one.
    pub draft_position: i32,
}

/// A validated draft start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStart {
    /// Positions for every participant in the league.
    pub draft_order: Vec<DraftSlot>,
    /// The session to create.
    pub session: DraftSessionRecord,
}

/// A validated draft reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftReset {
    /// The league to reset.
    pub league_id: Uuid,
    /// League status the reset was validated against.
    pub expected_status: LeagueStatus,
}

/// Persistent, authoritative store of leagues' draft state.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Reads the league, its participants, its session and its picks.
    ///
    /// Returns `DomainError::NotFound` if the league does not exist.
    async fn load_snapshot(&self, league_id: Uuid) -> Result<DraftSnapshot, DomainError>;

    /// Inserts the pick and advances the session counter, provided the
    /// session `session_id` still exists and is active at `pick.pick_overall`.
    async fn commit_pick(&self, commit: &PickCommit) -> Result<(), DomainError>;

    /// Assigns draft positions, creates the session and moves the league to
    /// `drafting`, provided it is still `pre_draft` with the same participants.
    async fn commit_start(&self, start: &DraftStart) -> Result<(), DomainError>;

    /// Deletes picks and session, clears draft positions and moves the league
    /// back to `pre_draft`. Returns the number of picks removed.
    async fn commit_reset(&self, reset: &DraftReset) -> Result<u64, DomainError>;

    /// Moves a `pre_draft` league straight to `active` without a session.
    async fn commit_skip(&self, league_id: Uuid) -> Result<(), DomainError>;
}

/// Read access to the catalog of draftable items.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Whether the item exists.
    async fn contains(&self, item_id: ItemId) -> Result<bool, DomainError>;

    /// Looks up display details for the given items. Unknown ids are left
    /// out of the result.
    async fn describe(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, CatalogItem>, DomainError>;
}
