//! League fixtures.

use chrono::{DateTime, Duration, TimeZone, Utc};
use draftpool_core::model::{DraftSnapshot, LeagueRecord, LeagueStatus, ParticipantRecord};
use uuid::Uuid;

/// A league with participants, ready to be inserted into a store.
///
/// The first participant added is the league creator. Participants join one
/// minute apart, in the order they are added.
#[derive(Debug, Clone)]
pub struct LeagueFixture {
    pub league: LeagueRecord,
    pub participants: Vec<ParticipantRecord>,
}

fn joined_base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

impl LeagueFixture {
    /// A `pre_draft` league with no participants.
    #[must_use]
    pub fn new(max_picks_per_participant: i32) -> Self {
        Self {
            league: LeagueRecord {
                id: Uuid::new_v4(),
                name: "Test League".to_owned(),
                season: 2026,
                max_picks_per_participant,
                status: LeagueStatus::PreDraft,
                created_by: Uuid::new_v4(),
            },
            participants: Vec::new(),
        }
    }

    /// Adds `count` participants. The creator is always the first one.
    #[must_use]
    pub fn with_participants(mut self, count: usize) -> Self {
        for _ in 0..count {
            let index = self.participants.len();
            let user_id = if index == 0 {
                self.league.created_by
            } else {
                Uuid::new_v4()
            };
            let minutes = i64::try_from(index).unwrap_or(i64::MAX);
            self.participants.push(ParticipantRecord {
                user_id,
                team_name: format!("Team {}", index + 1),
                draft_position: None,
                joined_at: joined_base() + Duration::minutes(minutes),
            });
        }
        self
    }

    /// Overrides the league status.
    #[must_use]
    pub fn with_status(mut self, status: LeagueStatus) -> Self {
        self.league.status = status;
        self
    }

    /// Participant ids in join order.
    #[must_use]
    pub fn user_ids(&self) -> Vec<Uuid> {
        self.participants.iter().map(|p| p.user_id).collect()
    }

    /// A snapshot of the fixture with no session and no picks.
    #[must_use]
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            league: self.league.clone(),
            participants: self.participants.clone(),
            session: None,
            picks: Vec::new(),
        }
    }
}
