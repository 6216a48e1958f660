//! Cross-worker delivery of draft notices over `LISTEN`/`NOTIFY`.
//!
//! Every worker publishes the notices of its own commits to one channel and
//! listens on that channel, so an observer connected to any worker hears about
//! commits made on all of them. Notices sent while a listener is reconnecting
//! are lost; observers catch up on their next periodic resync.

use draftpool_core::error::DomainError;
use draftpool_core::notice::{DraftNotice, DraftNotifier};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

/// `NOTIFY` channel carrying JSON-encoded [`DraftNotice`]s.
pub const DRAFT_NOTICE_CHANNEL: &str = "draft_changed";

fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

/// Publishes notices to [`DRAFT_NOTICE_CHANNEL`].
#[derive(Debug, Clone)]
pub struct PgNoticePublisher {
    pool: PgPool,
}

impl PgNoticePublisher {
    /// Creates a new `PgNoticePublisher`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sends one notice and waits until PostgreSQL has accepted it.
    ///
    /// # Errors
    ///
    /// Returns `Infrastructure` if the notice cannot be encoded or sent.
    pub async fn publish(&self, notice: &DraftNotice) -> Result<(), DomainError> {
        let payload = serde_json::to_string(notice)
            .map_err(|e| DomainError::Infrastructure(format!("cannot encode notice: {e}")))?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(DRAFT_NOTICE_CHANNEL)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

impl DraftNotifier for PgNoticePublisher {
    fn draft_changed(&self, notice: DraftNotice) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(league_id = %notice.league_id, "no async runtime, draft notice dropped");
            return;
        };
        let publisher = self.clone();
        runtime.spawn(async move {
            if let Err(e) = publisher.publish(&notice).await {
                warn!(league_id = %notice.league_id, error = %e, "draft notice not published");
            }
        });
    }
}

/// A live subscription to [`DRAFT_NOTICE_CHANNEL`].
pub struct PgNoticeRelay {
    listener: PgListener,
}

impl PgNoticeRelay {
    /// Opens a dedicated connection and starts listening. Notices published
    /// after this returns are guaranteed to reach [`PgNoticeRelay::run`].
    ///
    /// # Errors
    ///
    /// Returns `Infrastructure` if the connection or `LISTEN` fails.
    pub async fn listen(pool: &PgPool) -> Result<Self, DomainError> {
        let mut listener = PgListener::connect_with(pool).await.map_err(infra)?;
        listener.listen(DRAFT_NOTICE_CHANNEL).await.map_err(infra)?;
        Ok(Self { listener })
    }

    /// Hands every received notice to `sink`. Payloads that are not notices
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Infrastructure` once the listener connection is lost for good.
    #[instrument(skip_all)]
    pub async fn run(mut self, sink: &dyn DraftNotifier) -> Result<(), DomainError> {
        loop {
            let notification = self.listener.recv().await.map_err(infra)?;
            match serde_json::from_str::<DraftNotice>(notification.payload()) {
                Ok(notice) => {
                    debug!(
                        league_id = %notice.league_id,
                        kind = notice.kind.as_str(),
                        "relaying draft notice"
                    );
                    sink.draft_changed(notice);
                }
                Err(e) => warn!(error = %e, "skipping malformed draft notice"),
            }
        }
    }
}
