//! Persistent draft records.
//!
//! These mirror the rows the draft store keeps per league. Leagues,
//! participants and catalog items are owned by external collaborators; this
//! core only reads them and mutates the draft-related columns.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a draftable catalog item (a school).
pub type ItemId = i32;

/// Lifecycle status of a league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    /// Participants are joining; no draft has started.
    PreDraft,
    /// A snake draft is in progress.
    Drafting,
    /// The draft finished (or was skipped) and the season is running.
    Active,
    /// The season is over.
    Completed,
}

impl LeagueStatus {
    /// Column value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreDraft => "pre_draft",
            Self::Drafting => "drafting",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre_draft" => Ok(Self::PreDraft),
            "drafting" => Ok(Self::Drafting),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Infrastructure(format!(
                "unknown league status: {other}"
            ))),
        }
    }
}

/// Status of a league's draft session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session exists yet.
    NotStarted,
    /// Picks are being made.
    Active,
    /// Every pick has been made.
    Complete,
}

impl SessionStatus {
    /// Column value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            other => Err(DomainError::Infrastructure(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

/// A league as seen by the draft core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueRecord {
    /// League identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Season year.
    pub season: i32,
    /// Number of items each participant drafts.
    pub max_picks_per_participant: i32,
    /// Lifecycle status.
    pub status: LeagueStatus,
    /// User who created the league; the only one allowed lifecycle calls.
    pub created_by: Uuid,
}

/// A participant of a league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    /// The participant's user identity.
    pub user_id: Uuid,
    /// Team name shown on the board.
    pub team_name: String,
    /// Position in round one, assigned when the draft starts.
    pub draft_position: Option<i32>,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
}

/// Live progress record of a league's draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSessionRecord {
    /// Identity of this particular draft. A reset followed by a new start
    /// yields a different one, even though the counter starts over at 1.
    pub session_id: Uuid,
    /// League this session belongs to.
    pub league_id: Uuid,
    /// The pick being made next, starting at 1.
    pub current_pick_overall: i32,
    /// Picks in the whole draft, fixed at start.
    pub total_picks: i32,
    /// Session status.
    pub status: SessionStatus,
    /// When the draft started.
    pub started_at: DateTime<Utc>,
    /// When the final pick was committed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// One committed, immutable claim of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickRecord {
    /// League the pick belongs to.
    pub league_id: Uuid,
    /// The participant who made the pick.
    pub participant_id: Uuid,
    /// The claimed item.
    pub item_id: ItemId,
    /// Snake round the pick was made in.
    pub round: i32,
    /// Position in the league-wide pick sequence.
    pub pick_overall: i32,
    /// Commit timestamp.
    pub committed_at: DateTime<Utc>,
}

/// Presentation details of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    /// Item identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Grouping shown next to the name (a school's conference).
    pub category: Option<String>,
}

/// Everything the draft rules need to evaluate one operation, read at a
/// single point in time.
#[derive(Debug, Clone)]
pub struct DraftSnapshot {
    /// The league.
    pub league: LeagueRecord,
    /// Participants ordered by draft position, then join time.
    pub participants: Vec<ParticipantRecord>,
    /// The session, when a draft has been started.
    pub session: Option<DraftSessionRecord>,
    /// Committed picks ordered by `pick_overall`.
    pub picks: Vec<PickRecord>,
}

impl DraftSnapshot {
    /// Looks up a participant by user id.
    #[must_use]
    pub fn participant(&self, user_id: Uuid) -> Option<&ParticipantRecord> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Number of picks the given participant holds.
    #[must_use]
    pub fn picks_held_by(&self, user_id: Uuid) -> usize {
        self.picks
            .iter()
            .filter(|p| p.participant_id == user_id)
            .count()
    }

    /// Whether the item has been claimed in this league.
    #[must_use]
    pub fn is_item_taken(&self, item_id: ItemId) -> bool {
        self.picks.iter().any(|p| p.item_id == item_id)
    }

    /// Whether the user may look at this league's draft: any participant,
    /// and the creator.
    #[must_use]
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.league.created_by == user_id || self.participant(user_id).is_some()
    }
}
