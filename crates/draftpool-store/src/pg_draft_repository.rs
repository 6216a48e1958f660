//! `PostgreSQL` implementation of the `DraftRepository` trait.
//!
//! Each commit runs in one transaction and guards itself with a conditional
//! `UPDATE` on the row that carries the state it was validated against (the
//! session id and counter for picks, the league status for lifecycle
//! changes). Zero affected rows means another worker got there first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use draftpool_core::error::{DomainError, Missing};
use draftpool_core::model::{
    DraftSessionRecord, DraftSnapshot, LeagueRecord, LeagueStatus, ParticipantRecord, PickRecord,
    SessionStatus,
};
use draftpool_core::repository::{DraftRepository, DraftReset, DraftStart, PickCommit};

#[derive(FromRow)]
struct LeagueRow {
    id: Uuid,
    name: String,
    season: i32,
    max_picks_per_participant: i32,
    status: String,
    created_by: Uuid,
}

#[derive(FromRow)]
struct ParticipantRow {
    user_id: Uuid,
    team_name: String,
    draft_position: Option<i32>,
    joined_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SessionRow {
    session_id: Uuid,
    league_id: Uuid,
    current_pick_overall: i32,
    total_picks: i32,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct PickRow {
    league_id: Uuid,
    participant_id: Uuid,
    school_id: i32,
    round: i32,
    pick_overall: i32,
    committed_at: DateTime<Utc>,
}

impl TryFrom<LeagueRow> for LeagueRecord {
    type Error = DomainError;

    fn try_from(row: LeagueRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            season: row.season,
            max_picks_per_participant: row.max_picks_per_participant,
            status: row.status.parse()?,
            created_by: row.created_by,
        })
    }
}

impl From<ParticipantRow> for ParticipantRecord {
    fn from(row: ParticipantRow) -> Self {
        Self {
            user_id: row.user_id,
            team_name: row.team_name,
            draft_position: row.draft_position,
            joined_at: row.joined_at,
        }
    }
}

impl TryFrom<SessionRow> for DraftSessionRecord {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: row.session_id,
            league_id: row.league_id,
            current_pick_overall: row.current_pick_overall,
            total_picks: row.total_picks,
            status: row.status.parse()?,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

impl From<PickRow> for PickRecord {
    fn from(row: PickRow) -> Self {
        Self {
            league_id: row.league_id,
            participant_id: row.participant_id,
            item_id: row.school_id,
            round: row.round,
            pick_overall: row.pick_overall,
            committed_at: row.committed_at,
        }
    }
}

fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn conflict(league_id: Uuid, detail: impl Into<String>) -> DomainError {
    DomainError::ConcurrencyConflict {
        league_id,
        detail: detail.into(),
    }
}

/// Maps a unique-constraint violation to a concurrency conflict; any other
/// database error is infrastructure.
fn conflict_on_unique(league_id: Uuid, err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict(
            league_id,
            format!(
                "unique constraint {} violated",
                db.constraint().unwrap_or("unknown")
            ),
        ),
        _ => infra(err),
    }
}

/// PostgreSQL-backed draft repository.
#[derive(Debug, Clone)]
pub struct PgDraftRepository {
    pool: PgPool,
}

impl PgDraftRepository {
    /// Creates a new `PgDraftRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool.begin().await.map_err(infra)
    }
}

#[async_trait]
impl DraftRepository for PgDraftRepository {
    #[instrument(skip(self))]
    async fn load_snapshot(&self, league_id: Uuid) -> Result<DraftSnapshot, DomainError> {
        let mut tx = self.begin().await?;
        // One consistent view across the four reads.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        let league: LeagueRow = sqlx::query_as(
            "SELECT id, name, season, max_picks_per_participant, status, created_by \
             FROM leagues WHERE id = $1",
        )
        .bind(league_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infra)?
        .ok_or_else(|| DomainError::not_found(Missing::League, league_id))?;

        let participants: Vec<ParticipantRow> = sqlx::query_as(
            "SELECT user_id, team_name, draft_position, joined_at \
             FROM league_participants WHERE league_id = $1 \
             ORDER BY draft_position NULLS LAST, joined_at, user_id",
        )
        .bind(league_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(infra)?;

        let session: Option<SessionRow> = sqlx::query_as(
            "SELECT session_id, league_id, current_pick_overall, total_picks, status, \
             started_at, completed_at \
             FROM draft_sessions WHERE league_id = $1",
        )
        .bind(league_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infra)?;

        let picks: Vec<PickRow> = sqlx::query_as(
            "SELECT league_id, participant_id, school_id, round, pick_overall, committed_at \
             FROM draft_picks WHERE league_id = $1 ORDER BY pick_overall",
        )
        .bind(league_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;

        Ok(DraftSnapshot {
            league: LeagueRecord::try_from(league)?,
            participants: participants.into_iter().map(Into::into).collect(),
            session: session.map(DraftSessionRecord::try_from).transpose()?,
            picks: picks.into_iter().map(Into::into).collect(),
        })
    }

    #[instrument(skip_all, fields(
        league_id = %commit.pick.league_id,
        pick_overall = commit.pick.pick_overall,
    ))]
    async fn commit_pick(&self, commit: &PickCommit) -> Result<(), DomainError> {
        let pick = &commit.pick;
        let mut tx = self.begin().await?;

        let advanced = sqlx::query(
            "UPDATE draft_sessions \
             SET current_pick_overall = current_pick_overall + 1, \
                 status = CASE WHEN $3 THEN $5 ELSE status END, \
                 completed_at = COALESCE($4, completed_at) \
             WHERE league_id = $1 AND current_pick_overall = $2 AND status = $6 \
               AND session_id = $7",
        )
        .bind(pick.league_id)
        .bind(pick.pick_overall)
        .bind(commit.completed_at.is_some())
        .bind(commit.completed_at)
        .bind(SessionStatus::Complete.as_str())
        .bind(SessionStatus::Active.as_str())
        .bind(commit.session_id)
        .execute(&mut *tx)
        .await
        .map_err(infra)?
        .rows_affected();
        if advanced == 0 {
            return Err(conflict(
                pick.league_id,
                format!(
                    "session {} is no longer at pick {}",
                    commit.session_id, pick.pick_overall
                ),
            ));
        }

        sqlx::query(
            "INSERT INTO draft_picks \
             (league_id, participant_id, school_id, round, pick_overall, committed_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(pick.league_id)
        .bind(pick.participant_id)
        .bind(pick.item_id)
        .bind(pick.round)
        .bind(pick.pick_overall)
        .bind(pick.committed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(pick.league_id, e))?;

        if commit.completed_at.is_some() {
            sqlx::query("UPDATE leagues SET status = $2 WHERE id = $1 AND status = $3")
                .bind(pick.league_id)
                .bind(LeagueStatus::Active.as_str())
                .bind(LeagueStatus::Drafting.as_str())
                .execute(&mut *tx)
                .await
                .map_err(infra)?;
        }

        tx.commit().await.map_err(infra)?;
        debug!("pick row committed");
        Ok(())
    }

    #[instrument(skip_all, fields(league_id = %start.session.league_id))]
    async fn commit_start(&self, start: &DraftStart) -> Result<(), DomainError> {
        let session = &start.session;
        let league_id = session.league_id;
        let mut tx = self.begin().await?;

        let moved = sqlx::query(
            "UPDATE leagues SET status = $2 WHERE id = $1 AND status = $3 \
             AND NOT EXISTS (SELECT 1 FROM draft_sessions WHERE league_id = $1)",
        )
        .bind(league_id)
        .bind(LeagueStatus::Drafting.as_str())
        .bind(LeagueStatus::PreDraft.as_str())
        .execute(&mut *tx)
        .await
        .map_err(infra)?
        .rows_affected();
        if moved == 0 {
            return Err(conflict(league_id, "league is no longer pre_draft"));
        }

        let mut members: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM league_participants WHERE league_id = $1 FOR UPDATE",
        )
        .bind(league_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(infra)?;
        let mut ordered: Vec<Uuid> = start.draft_order.iter().map(|s| s.user_id).collect();
        members.sort_unstable();
        ordered.sort_unstable();
        if members != ordered {
            return Err(conflict(league_id, "participants changed since validation"));
        }

        for slot in &start.draft_order {
            sqlx::query(
                "UPDATE league_participants SET draft_position = $3 \
                 WHERE league_id = $1 AND user_id = $2",
            )
            .bind(league_id)
            .bind(slot.user_id)
            .bind(slot.draft_position)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(league_id, e))?;
        }

        sqlx::query(
            "INSERT INTO draft_sessions \
             (session_id, league_id, current_pick_overall, total_picks, status, \
              started_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.session_id)
        .bind(league_id)
        .bind(session.current_pick_overall)
        .bind(session.total_picks)
        .bind(session.status.as_str())
        .bind(session.started_at)
        .bind(session.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(league_id, e))?;

        tx.commit().await.map_err(infra)?;
        debug!(participants = start.draft_order.len(), "draft session created");
        Ok(())
    }

    #[instrument(skip_all, fields(league_id = %reset.league_id))]
    async fn commit_reset(&self, reset: &DraftReset) -> Result<u64, DomainError> {
        let league_id = reset.league_id;
        let mut tx = self.begin().await?;

        let status: String =
            sqlx::query_scalar("SELECT status FROM leagues WHERE id = $1 FOR UPDATE")
                .bind(league_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(infra)?
                .ok_or_else(|| DomainError::not_found(Missing::League, league_id))?;
        let status: LeagueStatus = status.parse()?;
        if status != reset.expected_status {
            return Err(conflict(league_id, format!("league status is now {status}")));
        }

        let removed = sqlx::query("DELETE FROM draft_picks WHERE league_id = $1")
            .bind(league_id)
            .execute(&mut *tx)
            .await
            .map_err(infra)?
            .rows_affected();

        sqlx::query("DELETE FROM draft_sessions WHERE league_id = $1")
            .bind(league_id)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        sqlx::query("UPDATE league_participants SET draft_position = NULL WHERE league_id = $1")
            .bind(league_id)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        sqlx::query("UPDATE leagues SET status = $2 WHERE id = $1")
            .bind(league_id)
            .bind(LeagueStatus::PreDraft.as_str())
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        debug!(removed, "draft state wiped");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn commit_skip(&self, league_id: Uuid) -> Result<(), DomainError> {
        let moved = sqlx::query(
            "UPDATE leagues SET status = $2 WHERE id = $1 AND status = $3 \
             AND NOT EXISTS (SELECT 1 FROM draft_sessions WHERE league_id = $1)",
        )
        .bind(league_id)
        .bind(LeagueStatus::Active.as_str())
        .bind(LeagueStatus::PreDraft.as_str())
        .execute(&self.pool)
        .await
        .map_err(infra)?
        .rows_affected();
        if moved == 0 {
            return Err(conflict(league_id, "league is no longer pre_draft"));
        }
        Ok(())
    }
}
