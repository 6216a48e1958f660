//! Commands for the draft context.

use draftpool_core::command::Command;
use draftpool_core::model::ItemId;
use uuid::Uuid;

/// Command to claim an item for the participant on the clock.
#[derive(Debug, Clone)]
pub struct SubmitPick {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The league being drafted.
    pub league_id: Uuid,
    /// The participant making the pick (the verified caller).
    pub participant_id: Uuid,
    /// The item being claimed.
    pub item_id: ItemId,
}

impl Command for SubmitPick {
    fn command_type(&self) -> &'static str {
        "draft.submit_pick"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn league_id(&self) -> Uuid {
        self.league_id
    }
}

/// Command to randomize the draft order and open the draft.
#[derive(Debug, Clone)]
pub struct StartDraft {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The league to start.
    pub league_id: Uuid,
    /// The caller; must be the league creator.
    pub requester_id: Uuid,
}

impl Command for StartDraft {
    fn command_type(&self) -> &'static str {
        "draft.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn league_id(&self) -> Uuid {
        self.league_id
    }
}

/// Command to wipe all picks and return the league to `pre_draft`.
#[derive(Debug, Clone)]
pub struct ResetDraft {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The league to reset.
    pub league_id: Uuid,
    /// The caller; must be the league creator.
    pub requester_id: Uuid,
}

impl Command for ResetDraft {
    fn command_type(&self) -> &'static str {
        "draft.reset"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn league_id(&self) -> Uuid {
        self.league_id
    }
}

/// Command to activate a league without drafting.
#[derive(Debug, Clone)]
pub struct SkipDraft {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The league to activate.
    pub league_id: Uuid,
    /// The caller; must be the league creator.
    pub requester_id: Uuid,
}

impl Command for SkipDraft {
    fn command_type(&self) -> &'static str {
        "draft.skip"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn league_id(&self) -> Uuid {
        self.league_id
    }
}
