//! Integration tests for `PgNoticePublisher` and `PgNoticeRelay`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use draftpool_core::notice::{DraftChangeKind, DraftNotice, DraftNotifier};
use draftpool_store::pg_notice_relay::{DRAFT_NOTICE_CHANNEL, PgNoticePublisher, PgNoticeRelay};
use draftpool_test_support::RecordingNotifier;
use sqlx::PgPool;
use uuid::Uuid;

fn notice(kind: DraftChangeKind) -> DraftNotice {
    DraftNotice {
        league_id: Uuid::new_v4(),
        kind,
        correlation_id: Uuid::new_v4(),
        occurred_at: Utc::now(),
    }
}

/// Starts a relay feeding a fresh recorder.
async fn relay_into_recorder(pool: &PgPool) -> (Arc<RecordingNotifier>, tokio::task::JoinHandle<()>) {
    let relay = PgNoticeRelay::listen(pool).await.unwrap();
    let recorder = Arc::new(RecordingNotifier::new());
    let sink = Arc::clone(&recorder);
    let task = tokio::spawn(async move {
        let _ = relay.run(sink.as_ref()).await;
    });
    (recorder, task)
}

/// Polls until the recorder holds `count` notices.
async fn wait_for(recorder: &RecordingNotifier, count: usize) -> Vec<DraftNotice> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let notices = recorder.notices();
            if notices.len() >= count {
                return notices;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("notices did not arrive in time")
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_published_notice_reaches_the_relay(pool: PgPool) {
    // Arrange
    let (recorder, task) = relay_into_recorder(&pool).await;
    let sent = notice(DraftChangeKind::PickMade);

    // Act
    PgNoticePublisher::new(pool.clone()).publish(&sent).await.unwrap();

    // Assert
    assert_eq!(wait_for(&recorder, 1).await, vec![sent]);
    task.abort();
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_notifier_impl_publishes_in_the_background(pool: PgPool) {
    // Arrange
    let (recorder, task) = relay_into_recorder(&pool).await;
    let publisher = PgNoticePublisher::new(pool.clone());
    let sent = notice(DraftChangeKind::DraftReset);

    // Act
    publisher.draft_changed(sent.clone());

    // Assert
    assert_eq!(wait_for(&recorder, 1).await, vec![sent]);
    task.abort();
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_malformed_payload_is_skipped(pool: PgPool) {
    // Arrange
    let (recorder, task) = relay_into_recorder(&pool).await;
    let sent = notice(DraftChangeKind::DraftStarted);

    // Act
    sqlx::query("SELECT pg_notify($1, 'not a notice')")
        .bind(DRAFT_NOTICE_CHANNEL)
        .execute(&pool)
        .await
        .unwrap();
    PgNoticePublisher::new(pool.clone()).publish(&sent).await.unwrap();

    // Assert
    assert_eq!(wait_for(&recorder, 1).await, vec![sent]);
    task.abort();
}
