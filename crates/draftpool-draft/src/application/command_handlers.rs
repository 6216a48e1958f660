//! Command handlers for the draft context.
//!
//! Each handler loads a snapshot, validates the command against it, and hands
//! the resulting commit to the store. When the store reports that the league
//! moved on between snapshot and commit, the command is validated again
//! against fresh state, so the loser of a race gets the precise rejection
//! (usually `TurnViolation` or `ITEM_TAKEN`) instead of a generic conflict.
//! A command that fails validation is never retried.

use std::sync::Mutex;

use draftpool_core::clock::Clock;
use draftpool_core::command::Command;
use draftpool_core::error::{DomainError, Missing};
use draftpool_core::model::{LeagueRecord, LeagueStatus, PickRecord};
use draftpool_core::notice::{DraftChangeKind, DraftNotice, DraftNotifier};
use draftpool_core::repository::{DraftRepository, DraftStart, ItemCatalog};
use draftpool_core::rng::DeterministicRng;
use tracing::{info, instrument, warn};

use crate::domain::commands::{ResetDraft, SkipDraft, StartDraft, SubmitPick};
use crate::domain::rules::DraftState;

/// Snapshot-validate-commit attempts before giving up on a busy league.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Outcome of a committed pick.
#[derive(Debug, Clone)]
pub struct PickResult {
    /// The committed pick.
    pub pick: PickRecord,
    /// Whether this pick completed the draft.
    pub draft_complete: bool,
}

/// Outcome of a reset.
#[derive(Debug, Clone, Copy)]
pub struct ResetResult {
    /// Number of picks deleted.
    pub picks_removed: u64,
}

async fn load_state(
    repo: &dyn DraftRepository,
    league_id: uuid::Uuid,
) -> Result<DraftState, DomainError> {
    Ok(DraftState::new(repo.load_snapshot(league_id).await?))
}

fn notify(
    notifier: &dyn DraftNotifier,
    command: &dyn Command,
    kind: DraftChangeKind,
    clock: &dyn Clock,
) {
    notifier.draft_changed(DraftNotice {
        league_id: command.league_id(),
        kind,
        correlation_id: command.correlation_id(),
        occurred_at: clock.now(),
    });
}

/// Whether a commit failure should trigger another validation round.
fn should_revalidate(err: &DomainError, attempt: u32, command: &dyn Command) -> bool {
    if let DomainError::ConcurrencyConflict { detail, .. } = err {
        if attempt < MAX_COMMIT_ATTEMPTS {
            warn!(
                command = command.command_type(),
                league_id = %command.league_id(),
                attempt,
                detail = %detail,
                "league changed before commit, revalidating"
            );
            return true;
        }
    }
    false
}

/// Handles `SubmitPick`: checks the item exists, then validates the pick
/// against the league's current state and commits it atomically.
///
/// # Errors
///
/// Returns `NotFound` for an unknown item, league or participant, the
/// `DomainError` of the first failed draft rule, or a store error.
#[instrument(skip_all, fields(
    league_id = %command.league_id,
    participant_id = %command.participant_id,
    item_id = command.item_id,
    correlation_id = %command.correlation_id,
))]
pub async fn handle_submit_pick(
    command: &SubmitPick,
    clock: &dyn Clock,
    repo: &dyn DraftRepository,
    catalog: &dyn ItemCatalog,
    notifier: &dyn DraftNotifier,
) -> Result<PickResult, DomainError> {
    if !catalog.contains(command.item_id).await? {
        return Err(DomainError::not_found(Missing::Item, command.item_id));
    }

    let mut attempt = 1;
    loop {
        let state = load_state(repo, command.league_id).await?;
        let commit = state.validate_pick(command.participant_id, command.item_id, clock.now())?;

        match repo.commit_pick(&commit).await {
            Ok(()) => {
                let draft_complete = commit.completed_at.is_some();
                info!(
                    pick_overall = commit.pick.pick_overall,
                    round = commit.pick.round,
                    draft_complete,
                    "pick committed"
                );
                let kind = if draft_complete {
                    DraftChangeKind::DraftComplete
                } else {
                    DraftChangeKind::PickMade
                };
                notify(notifier, command, kind, clock);
                return Ok(PickResult {
                    pick: commit.pick,
                    draft_complete,
                });
            }
            Err(err) if should_revalidate(&err, attempt, command) => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}

/// Handles `StartDraft`: randomizes the draft order and opens the session.
///
/// The `Mutex` is locked only around the synchronous shuffle to avoid holding
/// a `MutexGuard` across await points.
///
/// # Errors
///
/// Returns `NotLeagueCreator`, `LEAGUE_NOT_PRE_DRAFT`, a validation error for
/// too few participants, or a store error.
#[instrument(skip_all, fields(
    league_id = %command.league_id,
    requester_id = %command.requester_id,
    correlation_id = %command.correlation_id,
))]
pub async fn handle_start_draft(
    command: &StartDraft,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    repo: &dyn DraftRepository,
    notifier: &dyn DraftNotifier,
) -> Result<DraftStart, DomainError> {
    let mut attempt = 1;
    loop {
        let state = load_state(repo, command.league_id).await?;

        let start = {
            let mut rng_guard = rng
                .lock()
                .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
            state.plan_start(command.requester_id, &mut *rng_guard, clock.now())?
        };

        match repo.commit_start(&start).await {
            Ok(()) => {
                info!(
                    participants = start.draft_order.len(),
                    total_picks = start.session.total_picks,
                    "draft started"
                );
                notify(notifier, command, DraftChangeKind::DraftStarted, clock);
                return Ok(start);
            }
            Err(err) if should_revalidate(&err, attempt, command) => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}

/// Handles `ResetDraft`: deletes every pick and the session and returns the
/// league to `pre_draft`. Irreversible; callers confirm intent beforehand.
///
/// # Errors
///
/// Returns `NotLeagueCreator`, `LEAGUE_NOT_RESETTABLE`, or a store error.
#[instrument(skip_all, fields(
    league_id = %command.league_id,
    requester_id = %command.requester_id,
    correlation_id = %command.correlation_id,
))]
pub async fn handle_reset_draft(
    command: &ResetDraft,
    clock: &dyn Clock,
    repo: &dyn DraftRepository,
    notifier: &dyn DraftNotifier,
) -> Result<ResetResult, DomainError> {
    let mut attempt = 1;
    loop {
        let state = load_state(repo, command.league_id).await?;
        let reset = state.plan_reset(command.requester_id)?;

        match repo.commit_reset(&reset).await {
            Ok(picks_removed) => {
                info!(picks_removed, "draft reset");
                notify(notifier, command, DraftChangeKind::DraftReset, clock);
                return Ok(ResetResult { picks_removed });
            }
            Err(err) if should_revalidate(&err, attempt, command) => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}

/// Handles `SkipDraft`: activates the league for manual assignment without
/// creating a draft session.
///
/// # Errors
///
/// Returns `NotLeagueCreator`, `LEAGUE_NOT_PRE_DRAFT`, a validation error for
/// an empty league, or a store error.
#[instrument(skip_all, fields(
    league_id = %command.league_id,
    requester_id = %command.requester_id,
    correlation_id = %command.correlation_id,
))]
pub async fn handle_skip_draft(
    command: &SkipDraft,
    clock: &dyn Clock,
    repo: &dyn DraftRepository,
    notifier: &dyn DraftNotifier,
) -> Result<LeagueRecord, DomainError> {
    let mut attempt = 1;
    loop {
        let state = load_state(repo, command.league_id).await?;
        state.plan_skip(command.requester_id)?;

        match repo.commit_skip(command.league_id).await {
            Ok(()) => {
                info!("draft skipped, league active");
                notify(notifier, command, DraftChangeKind::DraftSkipped, clock);
                let mut league = state.league().clone();
                league.status = LeagueStatus::Active;
                return Ok(league);
            }
            Err(err) if should_revalidate(&err, attempt, command) => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}
