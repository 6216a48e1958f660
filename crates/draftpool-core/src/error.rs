//! Domain error types.
//!
//! Every rejection cause has exactly one stable, machine-readable code so that
//! callers can tell "not your turn" apart from "item already taken".

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Why a league or draft session is in the wrong state for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    /// No active draft session exists for the league.
    DraftNotActive,
    /// The league has already left `pre_draft`.
    LeagueNotPreDraft,
    /// The league is neither drafting nor holding a completed draft.
    LeagueNotResettable,
    /// No participant holds the draft position that is on the clock.
    DraftOrderInconsistent,
}

impl StateViolation {
    /// Stable error code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::DraftNotActive => "draft_not_active",
            Self::LeagueNotPreDraft => "league_not_pre_draft",
            Self::LeagueNotResettable => "league_not_resettable",
            Self::DraftOrderInconsistent => "draft_order_inconsistent",
        }
    }
}

impl fmt::Display for StateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a pick collides with picks that are already committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickConflict {
    /// The item was already claimed in this league.
    ItemTaken,
    /// The participant already holds the maximum number of picks.
    ParticipantComplete,
}

impl PickConflict {
    /// Stable error code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::ItemTaken => "item_taken",
            Self::ParticipantComplete => "participant_complete",
        }
    }
}

impl fmt::Display for PickConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Unknown league.
    League,
    /// Caller is not a participant of the league.
    Participant,
    /// Unknown catalog item.
    Item,
}

impl Missing {
    /// Stable error code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::League => "league_not_found",
            Self::Participant => "participant_not_found",
            Self::Item => "item_not_found",
        }
    }
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::League => "league",
            Self::Participant => "participant",
            Self::Item => "item",
        };
        f.write_str(name)
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A pure calculation was called outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A privileged lifecycle operation was attempted by someone other than
    /// the league creator.
    #[error("user {requester_id} is not the creator of league {league_id}")]
    NotLeagueCreator {
        /// The league.
        league_id: Uuid,
        /// The caller.
        requester_id: Uuid,
    },

    /// The caller is neither a participant nor the creator of the league.
    #[error("user {user_id} is not a member of league {league_id}")]
    NotLeagueMember {
        /// The league.
        league_id: Uuid,
        /// The caller.
        user_id: Uuid,
    },

    /// The operation is invalid for the current league or session status.
    #[error("{violation}: {message}")]
    State {
        /// The violated state rule.
        violation: StateViolation,
        /// Human-readable detail.
        message: String,
    },

    /// The caller is not on the clock.
    #[error("participant {participant_id} is not on the clock; pick {pick_overall} belongs to {on_the_clock}")]
    TurnViolation {
        /// The participant that tried to pick.
        participant_id: Uuid,
        /// The participant whose turn it is.
        on_the_clock: Uuid,
        /// The pick number currently being made.
        pick_overall: i32,
    },

    /// The pick collides with already-committed picks.
    #[error("pick rejected: {0}")]
    Conflict(PickConflict),

    /// An entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up.
        kind: Missing,
        /// The identifier that was looked up.
        id: String,
    },

    /// The stored draft state changed between snapshot and commit.
    #[error("concurrency conflict on league {league_id}: {detail}")]
    ConcurrencyConflict {
        /// The league whose state moved.
        league_id: Uuid,
        /// What no longer matched.
        detail: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a [`DomainError::State`].
    #[must_use]
    pub fn state(violation: StateViolation, message: impl Into<String>) -> Self {
        Self::State {
            violation,
            message: message.into(),
        }
    }

    /// Shorthand for a [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(kind: Missing, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable, machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotLeagueCreator { .. } => "not_league_creator",
            Self::NotLeagueMember { .. } => "not_league_member",
            Self::State { violation, .. } => violation.code(),
            Self::TurnViolation { .. } => "not_your_turn",
            Self::Conflict(conflict) => conflict.code(),
            Self::NotFound { kind, .. } => kind.code(),
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Infrastructure(_) => "service_unavailable",
        }
    }

    /// True when the rejection usually means the caller acted on a stale view
    /// of the draft rather than on a bug.
    #[must_use]
    pub fn is_stale_view(&self) -> bool {
        matches!(self, Self::TurnViolation { .. } | Self::Conflict(_))
    }

    /// True for failures a client may retry after re-reading draft status.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::Infrastructure(_)
        )
    }
}
