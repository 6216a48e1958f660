//! Draft change notices.
//!
//! A notice only tells observers that a league's draft changed. It is never
//! authoritative: receivers re-fetch status and board on every notice, which
//! makes duplicate, dropped or reordered delivery harmless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of committed mutation produced the notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftChangeKind {
    /// A draft session was created.
    DraftStarted,
    /// A pick was committed.
    PickMade,
    /// The final pick was committed and the league became active.
    DraftComplete,
    /// Picks and session were wiped.
    DraftReset,
    /// The league went active without a draft.
    DraftSkipped,
}

impl DraftChangeKind {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DraftStarted => "draft_started",
            Self::PickMade => "pick_made",
            Self::DraftComplete => "draft_complete",
            Self::DraftReset => "draft_reset",
            Self::DraftSkipped => "draft_skipped",
        }
    }
}

/// "Re-fetch now" signal for one league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftNotice {
    /// League whose draft changed.
    pub league_id: Uuid,
    /// Hint about what changed.
    pub kind: DraftChangeKind,
    /// Correlation ID of the command that caused the change.
    pub correlation_id: Uuid,
    /// When the change was committed.
    pub occurred_at: DateTime<Utc>,
}

/// Fire-and-forget sink for draft notices.
///
/// Implementations must not block and must not fail the caller: delivery
/// problems are theirs to log and absorb.
pub trait DraftNotifier: Send + Sync {
    /// Hands a notice over for delivery.
    fn draft_changed(&self, notice: DraftNotice);
}
