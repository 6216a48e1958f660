//! Query handlers for the draft context.
//!
//! Queries read a single snapshot and never lock anything, so the views they
//! return can be momentarily stale. Clients re-fetch them whenever a
//! `draft_update` notice arrives.

use chrono::{DateTime, Utc};
use draftpool_core::error::DomainError;
use draftpool_core::model::{ItemId, LeagueStatus, SessionStatus};
use draftpool_core::repository::{DraftRepository, ItemCatalog};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::rules::DraftState;

/// One participant's slot in the draft order.
#[derive(Debug, Clone, Serialize)]
pub struct DraftOrderEntry {
    /// Draft position, absent before the draft starts.
    pub draft_position: Option<i32>,
    /// The participant.
    pub user_id: Uuid,
    /// Display name of the participant's team.
    pub team_name: String,
}

/// Read-only view of a league's draft progress.
#[derive(Debug, Clone, Serialize)]
pub struct DraftStatusView {
    pub league_id: Uuid,
    pub league_status: LeagueStatus,
    pub session_status: SessionStatus,
    /// The pick being made, while a draft is active.
    pub current_pick_overall: Option<i32>,
    /// The round of the pick being made, while a draft is active.
    pub current_round: Option<i32>,
    pub on_the_clock_participant_id: Option<Uuid>,
    /// Whether the caller is the participant on the clock.
    pub is_caller_turn: bool,
    pub total_picks: i32,
    pub picks_made: i32,
    pub picks_remaining: i32,
    pub total_participants: i32,
    pub max_picks_per_participant: i32,
    /// Participants ordered by draft position, then join time.
    pub draft_order: Vec<DraftOrderEntry>,
}

/// One committed pick on the board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardPickView {
    pub pick_overall: i32,
    pub round: i32,
    pub participant_id: Uuid,
    pub team_name: String,
    pub item_id: ItemId,
    /// Catalog name of the item; absent if the catalog no longer knows it.
    pub item_name: Option<String>,
    /// Catalog grouping of the item, such as a school's conference.
    pub category: Option<String>,
    pub committed_at: DateTime<Utc>,
}

/// All picks of a league in pick order.
#[derive(Debug, Clone, Serialize)]
pub struct DraftBoardView {
    pub league_id: Uuid,
    pub picks: Vec<BoardPickView>,
    pub picks_made: i32,
    pub total_picks: i32,
    pub is_complete: bool,
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// Builds the status view from an already loaded state.
///
/// # Errors
///
/// Returns `DRAFT_ORDER_INCONSISTENT` when the draft is active but nobody
/// holds the position on the clock.
pub fn status_view(state: &DraftState, caller_id: Uuid) -> Result<DraftStatusView, DomainError> {
    let league = state.league();
    let on_the_clock = state.on_the_clock()?;
    let session_status = state
        .session()
        .map_or(SessionStatus::NotStarted, |s| s.status);
    let total_picks = state.total_picks();
    let picks_made = count(state.picks().len());

    let mut draft_order: Vec<DraftOrderEntry> = state
        .participants()
        .iter()
        .map(|p| DraftOrderEntry {
            draft_position: p.draft_position,
            user_id: p.user_id,
            team_name: p.team_name.clone(),
        })
        .collect();
    draft_order.sort_by_key(|e| (e.draft_position.is_none(), e.draft_position));

    Ok(DraftStatusView {
        league_id: league.id,
        league_status: league.status,
        session_status,
        current_pick_overall: on_the_clock.map(|c| c.pick_overall),
        current_round: on_the_clock.map(|c| c.slot.round),
        on_the_clock_participant_id: on_the_clock.map(|c| c.participant.user_id),
        is_caller_turn: on_the_clock.is_some_and(|c| c.participant.user_id == caller_id),
        total_picks,
        picks_made,
        picks_remaining: total_picks.saturating_sub(picks_made).max(0),
        total_participants: count(state.participants().len()),
        max_picks_per_participant: league.max_picks_per_participant,
        draft_order,
    })
}

/// Loads a league's state on behalf of a caller who must be allowed to see it.
///
/// # Errors
///
/// Returns `NotFound` for an unknown league, `NotLeagueMember` for an
/// outsider, and `Infrastructure` if the store cannot be read.
pub async fn load_visible_state(
    league_id: Uuid,
    caller_id: Uuid,
    repo: &dyn DraftRepository,
) -> Result<DraftState, DomainError> {
    let state = DraftState::new(repo.load_snapshot(league_id).await?);
    state.authorize_viewer(caller_id)?;
    Ok(state)
}

/// Retrieves the draft status of a league as seen by `caller_id`.
///
/// # Errors
///
/// Returns `NotFound` for an unknown league, `NotLeagueMember` for an
/// outsider, and `Infrastructure` if the store cannot be read.
pub async fn get_draft_status(
    league_id: Uuid,
    caller_id: Uuid,
    repo: &dyn DraftRepository,
) -> Result<DraftStatusView, DomainError> {
    let state = load_visible_state(league_id, caller_id, repo).await?;
    status_view(&state, caller_id)
}

/// Retrieves every committed pick of a league in pick order, with catalog
/// details for each item.
///
/// # Errors
///
/// Returns `NotFound` for an unknown league, `NotLeagueMember` for an
/// outsider, and `Infrastructure` if the store or catalog cannot be read.
pub async fn get_draft_board(
    league_id: Uuid,
    caller_id: Uuid,
    repo: &dyn DraftRepository,
    catalog: &dyn ItemCatalog,
) -> Result<DraftBoardView, DomainError> {
    let state = load_visible_state(league_id, caller_id, repo).await?;
    let item_ids: Vec<ItemId> = state.picks().iter().map(|p| p.item_id).collect();
    let details = catalog.describe(&item_ids).await?;

    let mut picks: Vec<BoardPickView> = state
        .picks()
        .iter()
        .map(|pick| BoardPickView {
            pick_overall: pick.pick_overall,
            round: pick.round,
            participant_id: pick.participant_id,
            team_name: state
                .participants()
                .iter()
                .find(|p| p.user_id == pick.participant_id)
                .map(|p| p.team_name.clone())
                .unwrap_or_default(),
            item_id: pick.item_id,
            item_name: details.get(&pick.item_id).map(|item| item.name.clone()),
            category: details
                .get(&pick.item_id)
                .and_then(|item| item.category.clone()),
            committed_at: pick.committed_at,
        })
        .collect();
    picks.sort_by_key(|p| p.pick_overall);

    Ok(DraftBoardView {
        league_id,
        picks_made: count(picks.len()),
        picks,
        total_picks: state.total_picks(),
        is_complete: state
            .session()
            .is_some_and(|s| s.status == SessionStatus::Complete),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use draftpool_core::error::{DomainError, Missing};
    use draftpool_core::model::{LeagueStatus, SessionStatus};
    use draftpool_core::rng::DeterministicRng;
    use draftpool_test_support::{
        FailingDraftRepository, FixedClock, InMemoryDraftRepository, LeagueFixture,
        RecordingNotifier, SequenceRng, StaticItemCatalog,
    };
    use uuid::Uuid;

    use super::*;
    use crate::application::command_handlers::{handle_start_draft, handle_submit_pick};
    use crate::domain::commands::{StartDraft, SubmitPick};

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    async fn started(fixture: &LeagueFixture, repo: &InMemoryDraftRepository) {
        // Draws equal to the index keep join order as draft order.
        let draws: Vec<u32> = (1..u32::try_from(fixture.participants.len()).unwrap())
            .rev()
            .collect();
        let rng = Mutex::new(SequenceRng::new(draws));
        let rng_ref: &Mutex<dyn DeterministicRng + Send> = &rng;
        handle_start_draft(
            &StartDraft {
                correlation_id: Uuid::new_v4(),
                league_id: fixture.league.id,
                requester_id: fixture.league.created_by,
            },
            &fixed_clock(),
            rng_ref,
            repo,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
    }

    async fn pick(fixture: &LeagueFixture, repo: &InMemoryDraftRepository, who: usize, item: i32) {
        handle_submit_pick(
            &SubmitPick {
                correlation_id: Uuid::new_v4(),
                league_id: fixture.league.id,
                participant_id: fixture.user_ids()[who],
                item_id: item,
            },
            &fixed_clock(),
            repo,
            &StaticItemCatalog::new(1..=100),
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_draft_status_before_start_has_nobody_on_the_clock() {
        // Arrange
        let fixture = LeagueFixture::new(3).with_participants(4);
        let repo = InMemoryDraftRepository::new();
        repo.insert_league(&fixture);

        // Act
        let view = get_draft_status(fixture.league.id, fixture.user_ids()[0], &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(view.league_status, LeagueStatus::PreDraft);
        assert_eq!(view.session_status, SessionStatus::NotStarted);
        assert_eq!(view.on_the_clock_participant_id, None);
        assert_eq!(view.current_pick_overall, None);
        assert!(!view.is_caller_turn);
        assert_eq!(view.total_picks, 12);
        assert_eq!(view.picks_remaining, 12);
        assert_eq!(view.total_participants, 4);
        assert!(view.draft_order.iter().all(|e| e.draft_position.is_none()));
    }

    #[tokio::test]
    async fn test_get_draft_status_reports_caller_turn_at_snake_boundary() {
        // Arrange
        let fixture = LeagueFixture::new(2).with_participants(3);
        let repo = InMemoryDraftRepository::new();
        repo.insert_league(&fixture);
        started(&fixture, &repo).await;
        pick(&fixture, &repo, 0, 1).await;
        pick(&fixture, &repo, 1, 2).await;
        pick(&fixture, &repo, 2, 3).await;
        let last = fixture.user_ids()[2];

        // Act
        let view = get_draft_status(fixture.league.id, last, &repo).await.unwrap();

        // Assert
        assert_eq!(view.session_status, SessionStatus::Active);
        assert_eq!(view.current_pick_overall, Some(4));
        assert_eq!(view.current_round, Some(2));
        assert_eq!(view.on_the_clock_participant_id, Some(last));
        assert!(view.is_caller_turn);
        assert_eq!(view.picks_made, 3);
        assert_eq!(view.picks_remaining, 3);
        let positions: Vec<Option<i32>> =
            view.draft_order.iter().map(|e| e.draft_position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(view.draft_order[0].user_id, fixture.user_ids()[0]);
    }

    #[tokio::test]
    async fn test_get_draft_status_refuses_outsiders() {
        // Arrange
        let fixture = LeagueFixture::new(1).with_participants(2);
        let repo = InMemoryDraftRepository::new();
        repo.insert_league(&fixture);
        let outsider = Uuid::new_v4();

        // Act
        let result = get_draft_status(fixture.league.id, outsider, &repo).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::NotLeagueMember { user_id, .. }) if user_id == outsider
        ));
    }

    #[tokio::test]
    async fn test_get_draft_status_returns_not_found_for_unknown_league() {
        // Arrange
        let repo = InMemoryDraftRepository::new();

        // Act
        let result = get_draft_status(Uuid::new_v4(), Uuid::new_v4(), &repo).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::NotFound {
                kind: Missing::League,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_get_draft_board_lists_picks_in_order_with_team_names() {
        // Arrange
        let fixture = LeagueFixture::new(1).with_participants(2);
        let repo = InMemoryDraftRepository::new();
        repo.insert_league(&fixture);
        started(&fixture, &repo).await;
        pick(&fixture, &repo, 0, 17).await;
        pick(&fixture, &repo, 1, 4).await;

        let catalog = StaticItemCatalog::new(1..=100).with_item(17, "Ohio State", Some("Big Ten"));

        // Act
        let board = get_draft_board(fixture.league.id, fixture.user_ids()[1], &repo, &catalog)
            .await
            .unwrap();

        // Assert
        let items: Vec<i32> = board.picks.iter().map(|p| p.item_id).collect();
        assert_eq!(items, vec![17, 4]);
        assert_eq!(board.picks[0].pick_overall, 1);
        assert_eq!(board.picks[0].team_name, fixture.participants[0].team_name);
        assert_eq!(board.picks[0].item_name.as_deref(), Some("Ohio State"));
        assert_eq!(board.picks[0].category.as_deref(), Some("Big Ten"));
        assert_eq!(board.picks[1].item_name.as_deref(), Some("Item 4"));
        assert_eq!(board.picks[1].category, None);
        assert_eq!(board.picks_made, 2);
        assert_eq!(board.total_picks, 2);
        assert!(board.is_complete);
    }

    #[tokio::test]
    async fn test_get_draft_board_refuses_outsiders() {
        // Arrange
        let fixture = LeagueFixture::new(1).with_participants(2);
        let repo = InMemoryDraftRepository::new();
        repo.insert_league(&fixture);

        // Act
        let result = get_draft_board(
            fixture.league.id,
            Uuid::new_v4(),
            &repo,
            &StaticItemCatalog::new(1..=10),
        )
        .await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotLeagueMember { .. })));
    }

    #[tokio::test]
    async fn test_get_draft_board_propagates_store_failure() {
        // Act
        let result = get_draft_board(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &FailingDraftRepository,
            &StaticItemCatalog::new(1..=10),
        )
        .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
