//! Command abstractions.

use uuid::Uuid;

/// Trait implemented by every draft mutation request.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name of the command, used in logs.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried through logs and the resulting notice.
    fn correlation_id(&self) -> Uuid;

    /// League the command targets.
    fn league_id(&self) -> Uuid;
}
