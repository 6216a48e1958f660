//! Routes for the draft bounded context, nested under `/api/v1/leagues`.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use draftpool_core::error::DomainError;
use draftpool_core::model::{ItemId, LeagueRecord, PickRecord, SessionStatus};
use draftpool_draft::application::command_handlers;
use draftpool_draft::application::query_handlers::{
    self, DraftBoardView, DraftStatusView,
};
use draftpool_draft::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /picks.
#[derive(Debug, Deserialize)]
pub struct SubmitPickRequest {
    /// The item to claim.
    pub item_id: ItemId,
}

/// Response body for POST /picks.
#[derive(Debug, Serialize)]
pub struct SubmitPickResponse {
    pub pick: PickRecord,
    pub draft_complete: bool,
}

/// One assigned draft position.
#[derive(Debug, Serialize)]
pub struct DraftSlotView {
    pub draft_position: i32,
    pub user_id: Uuid,
}

/// Response body for POST /start.
#[derive(Debug, Serialize)]
pub struct StartDraftResponse {
    pub league_id: Uuid,
    pub session_status: SessionStatus,
    pub current_pick_overall: i32,
    pub total_picks: i32,
    pub draft_order: Vec<DraftSlotView>,
    /// The participant holding draft position 1.
    pub on_the_clock_participant_id: Option<Uuid>,
}

/// Response body for POST /reset.
#[derive(Debug, Serialize)]
pub struct ResetDraftResponse {
    pub league_id: Uuid,
    pub picks_removed: u64,
}

/// Adds the current draft status to rejections caused by a stale view.
async fn with_current_status(
    state: &AppState,
    league_id: Uuid,
    caller: Uuid,
    error: DomainError,
) -> ApiError {
    if !error.is_stale_view() {
        return error.into();
    }
    match query_handlers::get_draft_status(league_id, caller, &*state.draft_repository).await {
        Ok(current) => ApiError::from(error).with_current(current),
        Err(_) => error.into(),
    }
}

/// GET /{league_id}/draft/status
#[instrument(skip(state))]
async fn get_status(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
) -> Result<Json<DraftStatusView>, ApiError> {
    let view =
        query_handlers::get_draft_status(league_id, caller, &*state.draft_repository).await?;
    Ok(Json(view))
}

/// GET /{league_id}/draft/board
#[instrument(skip(state))]
async fn get_board(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
) -> Result<Json<DraftBoardView>, ApiError> {
    let view = query_handlers::get_draft_board(
        league_id,
        caller,
        &*state.draft_repository,
        &*state.item_catalog,
    )
    .await?;
    Ok(Json(view))
}

/// POST /{league_id}/draft/picks
#[instrument(skip(state, request), fields(item_id = request.item_id))]
async fn submit_pick(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
    Json(request): Json<SubmitPickRequest>,
) -> Result<Json<SubmitPickResponse>, ApiError> {
    let command = commands::SubmitPick {
        correlation_id: Uuid::new_v4(),
        league_id,
        participant_id: caller,
        item_id: request.item_id,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_pick command");

    match command_handlers::handle_submit_pick(
        &command,
        state.clock.as_ref(),
        &*state.draft_repository,
        &*state.item_catalog,
        state.notifier.as_ref(),
    )
    .await
    {
        Ok(result) => Ok(Json(SubmitPickResponse {
            pick: result.pick,
            draft_complete: result.draft_complete,
        })),
        Err(error) => Err(with_current_status(&state, league_id, caller, error).await),
    }
}

/// POST /{league_id}/draft/start
#[instrument(skip(state))]
async fn start_draft(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
) -> Result<Json<StartDraftResponse>, ApiError> {
    let command = commands::StartDraft {
        correlation_id: Uuid::new_v4(),
        league_id,
        requester_id: caller,
    };

    info!(correlation_id = %command.correlation_id, "handling start_draft command");

    let start = command_handlers::handle_start_draft(
        &command,
        state.clock.as_ref(),
        &state.rng,
        &*state.draft_repository,
        state.notifier.as_ref(),
    )
    .await?;

    let mut draft_order: Vec<DraftSlotView> = start
        .draft_order
        .iter()
        .map(|slot| DraftSlotView {
            draft_position: slot.draft_position,
            user_id: slot.user_id,
        })
        .collect();
    draft_order.sort_by_key(|s| s.draft_position);

    Ok(Json(StartDraftResponse {
        league_id,
        session_status: start.session.status,
        current_pick_overall: start.session.current_pick_overall,
        total_picks: start.session.total_picks,
        on_the_clock_participant_id: draft_order.first().map(|s| s.user_id),
        draft_order,
    }))
}

/// POST /{league_id}/draft/reset
#[instrument(skip(state))]
async fn reset_draft(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
) -> Result<Json<ResetDraftResponse>, ApiError> {
    let command = commands::ResetDraft {
        correlation_id: Uuid::new_v4(),
        league_id,
        requester_id: caller,
    };

    info!(correlation_id = %command.correlation_id, "handling reset_draft command");

    let result = command_handlers::handle_reset_draft(
        &command,
        state.clock.as_ref(),
        &*state.draft_repository,
        state.notifier.as_ref(),
    )
    .await?;

    Ok(Json(ResetDraftResponse {
        league_id,
        picks_removed: result.picks_removed,
    }))
}

/// POST /{league_id}/draft/skip
///
/// Responds with the activated league.
#[instrument(skip(state))]
async fn skip_draft(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    CallerId(caller): CallerId,
) -> Result<Json<LeagueRecord>, ApiError> {
    let command = commands::SkipDraft {
        correlation_id: Uuid::new_v4(),
        league_id,
        requester_id: caller,
    };

    info!(correlation_id = %command.correlation_id, "handling skip_draft command");

    let league = command_handlers::handle_skip_draft(
        &command,
        state.clock.as_ref(),
        &*state.draft_repository,
        state.notifier.as_ref(),
    )
    .await?;

    Ok(Json(league))
}

/// Returns the router for the draft context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{league_id}/draft/status", get(get_status))
        .route("/{league_id}/draft/board", get(get_board))
        .route("/{league_id}/draft/picks", post(submit_pick))
        .route("/{league_id}/draft/start", post(start_draft))
        .route("/{league_id}/draft/reset", post(reset_draft))
        .route("/{league_id}/draft/skip", post(skip_draft))
}
