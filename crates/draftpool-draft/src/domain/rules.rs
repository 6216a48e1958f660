//! Draft rules evaluated against a snapshot of stored state.
//!
//! `DraftState` never mutates anything. Each check returns the commit the
//! store has to apply, and the store refuses that commit if the state it was
//! derived from has moved on in the meantime.

use chrono::{DateTime, Utc};
use draftpool_core::error::{DomainError, Missing, PickConflict, StateViolation};
use draftpool_core::model::{
    DraftSessionRecord, DraftSnapshot, ItemId, LeagueRecord, LeagueStatus, ParticipantRecord,
    PickRecord, SessionStatus,
};
use draftpool_core::repository::{DraftReset, DraftSlot, DraftStart, PickCommit};
use draftpool_core::rng::{DeterministicRng, shuffle};
use uuid::Uuid;

use super::order::{SnakeSlot, locate};

/// Minimum participants for a snake draft.
pub const MIN_DRAFT_PARTICIPANTS: usize = 2;

/// Minimum participants to activate a league without drafting.
pub const MIN_SKIP_PARTICIPANTS: usize = 1;

/// The participant currently on the clock.
#[derive(Debug, Clone, Copy)]
pub struct OnTheClock<'a> {
    /// Where the current pick falls in the snake order.
    pub slot: SnakeSlot,
    /// The pick being made.
    pub pick_overall: i32,
    /// Who must make it.
    pub participant: &'a ParticipantRecord,
}

/// A league's draft state at one point in time.
#[derive(Debug, Clone)]
pub struct DraftState {
    snapshot: DraftSnapshot,
}

impl DraftState {
    /// Wraps a snapshot loaded from the store.
    #[must_use]
    pub fn new(snapshot: DraftSnapshot) -> Self {
        Self { snapshot }
    }

    /// The league.
    #[must_use]
    pub fn league(&self) -> &LeagueRecord {
        &self.snapshot.league
    }

    /// Participants ordered by draft position.
    #[must_use]
    pub fn participants(&self) -> &[ParticipantRecord] {
        &self.snapshot.participants
    }

    /// The session, if a draft was started.
    #[must_use]
    pub fn session(&self) -> Option<&DraftSessionRecord> {
        self.snapshot.session.as_ref()
    }

    /// Committed picks in pick order.
    #[must_use]
    pub fn picks(&self) -> &[PickRecord] {
        &self.snapshot.picks
    }

    fn participant_count(&self) -> i32 {
        i32::try_from(self.snapshot.participants.len()).unwrap_or(i32::MAX)
    }

    /// Total picks for the draft: the session's fixed figure once started,
    /// otherwise the projection from the current participant count.
    #[must_use]
    pub fn total_picks(&self) -> i32 {
        self.session().map_or_else(
            || {
                self.participant_count()
                    .saturating_mul(self.league().max_picks_per_participant)
            },
            |s| s.total_picks,
        )
    }

    /// The active session, or `DRAFT_NOT_ACTIVE`.
    fn active_session(&self) -> Result<&DraftSessionRecord, DomainError> {
        match self.session() {
            Some(session)
                if session.status == SessionStatus::Active
                    && self.league().status == LeagueStatus::Drafting =>
            {
                Ok(session)
            }
            Some(session) => Err(DomainError::state(
                StateViolation::DraftNotActive,
                format!("draft session is {}", session.status),
            )),
            None => Err(DomainError::state(
                StateViolation::DraftNotActive,
                format!("league is {} and has no draft session", self.league().status),
            )),
        }
    }

    /// Resolves who is on the clock. `None` unless a session is active.
    ///
    /// # Errors
    ///
    /// Returns `DRAFT_ORDER_INCONSISTENT` if no participant holds the draft
    /// position that is due.
    pub fn on_the_clock(&self) -> Result<Option<OnTheClock<'_>>, DomainError> {
        let Ok(session) = self.active_session() else {
            return Ok(None);
        };
        let slot = locate(session.current_pick_overall, self.participant_count())?;
        let participant = self
            .participants()
            .iter()
            .find(|p| p.draft_position == Some(slot.position_in_round))
            .ok_or_else(|| {
                DomainError::state(
                    StateViolation::DraftOrderInconsistent,
                    format!("no participant holds draft position {}", slot.position_in_round),
                )
            })?;
        Ok(Some(OnTheClock {
            slot,
            pick_overall: session.current_pick_overall,
            participant,
        }))
    }

    /// Validates a pick and builds its commit.
    ///
    /// Checks, in order: the draft is active, the participant belongs to the
    /// league, the participant is on the clock, the item is free, and the
    /// participant is below the pick cap.
    ///
    /// # Errors
    ///
    /// Returns the `DomainError` of the first failing check.
    pub fn validate_pick(
        &self,
        participant_id: Uuid,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<PickCommit, DomainError> {
        let session = self.active_session()?;

        if self.snapshot.participant(participant_id).is_none() {
            return Err(DomainError::not_found(Missing::Participant, participant_id));
        }

        let Some(clock) = self.on_the_clock()? else {
            return Err(DomainError::state(
                StateViolation::DraftNotActive,
                "draft is not active",
            ));
        };
        if clock.participant.user_id != participant_id {
            return Err(DomainError::TurnViolation {
                participant_id,
                on_the_clock: clock.participant.user_id,
                pick_overall: clock.pick_overall,
            });
        }

        if self.snapshot.is_item_taken(item_id) {
            return Err(DomainError::Conflict(PickConflict::ItemTaken));
        }

        let held = self.snapshot.picks_held_by(participant_id);
        let cap = usize::try_from(self.league().max_picks_per_participant).unwrap_or(0);
        if held >= cap {
            return Err(DomainError::Conflict(PickConflict::ParticipantComplete));
        }

        let completes_draft = session.current_pick_overall >= session.total_picks;
        Ok(PickCommit {
            session_id: session.session_id,
            pick: PickRecord {
                league_id: self.league().id,
                participant_id,
                item_id,
                round: clock.slot.round,
                pick_overall: session.current_pick_overall,
                committed_at: now,
            },
            completed_at: completes_draft.then_some(now),
        })
    }

    /// Checks that the caller may read this league's draft or follow it live.
    ///
    /// # Errors
    ///
    /// Returns `NotLeagueMember` for anyone but a participant or the creator.
    pub fn authorize_viewer(&self, caller_id: Uuid) -> Result<(), DomainError> {
        if self.snapshot.is_visible_to(caller_id) {
            Ok(())
        } else {
            Err(DomainError::NotLeagueMember {
                league_id: self.league().id,
                user_id: caller_id,
            })
        }
    }

    fn require_creator(&self, requester_id: Uuid) -> Result<(), DomainError> {
        if self.league().created_by == requester_id {
            Ok(())
        } else {
            Err(DomainError::NotLeagueCreator {
                league_id: self.league().id,
                requester_id,
            })
        }
    }

    fn require_pre_draft(&self, action: &str) -> Result<(), DomainError> {
        if self.league().status != LeagueStatus::PreDraft || self.session().is_some() {
            return Err(DomainError::state(
                StateViolation::LeagueNotPreDraft,
                format!("cannot {action}: league status is {}", self.league().status),
            ));
        }
        Ok(())
    }

    /// Validates a draft start and assigns a random draft order.
    ///
    /// Participants are taken in join order and shuffled with `rng`.
    ///
    /// # Errors
    ///
    /// Returns `NotLeagueCreator`, `LEAGUE_NOT_PRE_DRAFT`, or a validation
    /// error when fewer than two participants have joined.
    pub fn plan_start(
        &self,
        requester_id: Uuid,
        rng: &mut dyn DeterministicRng,
        now: DateTime<Utc>,
    ) -> Result<DraftStart, DomainError> {
        self.require_creator(requester_id)?;
        self.require_pre_draft("start the draft")?;

        if self.participants().len() < MIN_DRAFT_PARTICIPANTS {
            return Err(DomainError::Validation(format!(
                "need at least {MIN_DRAFT_PARTICIPANTS} participants to start the draft, have {}",
                self.participants().len()
            )));
        }
        if self.league().max_picks_per_participant < 1 {
            return Err(DomainError::Validation(
                "league must allow at least one pick per participant".to_owned(),
            ));
        }

        let mut joined: Vec<&ParticipantRecord> = self.participants().iter().collect();
        joined.sort_by_key(|p| (p.joined_at, p.user_id));
        shuffle(&mut joined, rng);

        let draft_order = (1..)
            .zip(joined)
            .map(|(draft_position, p)| DraftSlot {
                user_id: p.user_id,
                draft_position,
            })
            .collect();

        Ok(DraftStart {
            draft_order,
            session: DraftSessionRecord {
                session_id: Uuid::new_v4(),
                league_id: self.league().id,
                current_pick_overall: 1,
                total_picks: self.total_picks(),
                status: SessionStatus::Active,
                started_at: now,
                completed_at: None,
            },
        })
    }

    /// Validates a reset.
    ///
    /// A league can be reset while drafting, or once active if it got there
    /// by completing a draft.
    ///
    /// # Errors
    ///
    /// Returns `NotLeagueCreator` or `LEAGUE_NOT_RESETTABLE`.
    pub fn plan_reset(&self, requester_id: Uuid) -> Result<DraftReset, DomainError> {
        self.require_creator(requester_id)?;

        let status = self.league().status;
        let resettable = match (status, self.session()) {
            (LeagueStatus::Drafting, _) => true,
            (LeagueStatus::Active, Some(session)) => session.status == SessionStatus::Complete,
            _ => false,
        };
        if !resettable {
            return Err(DomainError::state(
                StateViolation::LeagueNotResettable,
                format!("cannot reset draft: league status is {status}"),
            ));
        }

        Ok(DraftReset {
            league_id: self.league().id,
            expected_status: status,
        })
    }

    /// Validates skipping the draft.
    ///
    /// # Errors
    ///
    /// Returns `NotLeagueCreator`, `LEAGUE_NOT_PRE_DRAFT`, or a validation
    /// error when nobody has joined.
    pub fn plan_skip(&self, requester_id: Uuid) -> Result<(), DomainError> {
        self.require_creator(requester_id)?;
        self.require_pre_draft("skip the draft")?;

        if self.participants().len() < MIN_SKIP_PARTICIPANTS {
            return Err(DomainError::Validation(format!(
                "need at least {MIN_SKIP_PARTICIPANTS} participant to activate the league"
            )));
        }
        Ok(())
    }
}
