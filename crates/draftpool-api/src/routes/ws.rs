//! WebSocket observer endpoint.
//!
//! Observers connect to `/api/v1/ws` as a verified caller, then subscribe to
//! leagues they belong to. The server pushes a `draft_update` hint after every
//! committed mutation in a subscribed league and a periodic `resync` hint per
//! subscribed league. Both mean "re-fetch status and board"; nothing
//! authoritative travels over the socket.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use chrono::{DateTime, Utc};
use draftpool_broadcast::{LeagueTopics, ObserverId};
use draftpool_core::notice::{DraftChangeKind, DraftNotice};
use draftpool_core::repository::DraftRepository;
use draftpool_draft::application::query_handlers;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::state::AppState;

/// Messages accepted from observers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubscribeDraft { league_id: Uuid },
    UnsubscribeDraft { league_id: Uuid },
    Heartbeat,
}

/// Messages pushed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SubscriptionConfirmed {
        league_id: Uuid,
    },
    SubscriptionRemoved {
        league_id: Uuid,
    },
    DraftUpdate {
        league_id: Uuid,
        update_type: DraftChangeKind,
        timestamp: DateTime<Utc>,
    },
    Resync {
        league_id: Uuid,
    },
    Pong,
    Error {
        code: &'static str,
        message: String,
    },
}

impl From<DraftNotice> for ServerMessage {
    fn from(notice: DraftNotice) -> Self {
        Self::DraftUpdate {
            league_id: notice.league_id,
            update_type: notice.kind,
            timestamp: notice.occurred_at,
        }
    }
}

/// One observer's connection state.
pub struct ObserverSession {
    topics: Arc<LeagueTopics>,
    draft_repository: Arc<dyn DraftRepository>,
    caller_id: Uuid,
    id: ObserverId,
    leagues: BTreeSet<Uuid>,
}

impl ObserverSession {
    /// Registers the observer with the hub on behalf of `caller_id`.
    #[must_use]
    pub fn connect(
        topics: Arc<LeagueTopics>,
        draft_repository: Arc<dyn DraftRepository>,
        caller_id: Uuid,
    ) -> (Self, mpsc::Receiver<DraftNotice>) {
        let (id, outbox) = topics.connect();
        (
            Self {
                topics,
                draft_repository,
                caller_id,
                id,
                leagues: BTreeSet::new(),
            },
            outbox,
        )
    }

    /// Leagues this observer is subscribed to.
    #[must_use]
    pub fn leagues(&self) -> &BTreeSet<Uuid> {
        &self.leagues
    }

    /// Applies one text frame from the observer and returns the reply.
    ///
    /// Subscribing requires the caller to be the league's creator or one of
    /// its participants.
    pub async fn handle_text(&mut self, text: &str) -> ServerMessage {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                return ServerMessage::Error {
                    code: "invalid_message",
                    message: format!("unrecognized message: {e}"),
                };
            }
        };

        match message {
            ClientMessage::SubscribeDraft { league_id } => {
                if let Err(e) = query_handlers::load_visible_state(
                    league_id,
                    self.caller_id,
                    &*self.draft_repository,
                )
                .await
                {
                    debug!(observer = %self.id, %league_id, error = %e, "subscription refused");
                    return ServerMessage::Error {
                        code: e.code(),
                        message: e.to_string(),
                    };
                }
                self.topics.join(self.id, league_id);
                self.leagues.insert(league_id);
                ServerMessage::SubscriptionConfirmed { league_id }
            }
            ClientMessage::UnsubscribeDraft { league_id } => {
                self.topics.leave(self.id, league_id);
                self.leagues.remove(&league_id);
                ServerMessage::SubscriptionRemoved { league_id }
            }
            ClientMessage::Heartbeat => ServerMessage::Pong,
        }
    }
}

impl Drop for ObserverSession {
    fn drop(&mut self) {
        self.topics.disconnect(self.id);
    }
}

async fn send<S>(sender: &mut S, message: &ServerMessage) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(message).unwrap_or_else(|_| String::from("{}"));
    sender.send(Message::Text(json.into())).await
}

/// Drives one observer until its stream ends, a send fails or its outbox
/// closes. The session is dropped on return, which removes the observer from
/// every league topic.
pub async fn run_observer<S, R, E>(
    mut session: ObserverSession,
    mut outbox: mpsc::Receiver<DraftNotice>,
    mut sender: S,
    mut receiver: R,
    resync_interval: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut resync = interval_at(Instant::now() + resync_interval, resync_interval);
    info!(observer = %session.id, caller_id = %session.caller_id, "WebSocket connected");

    loop {
        let outgoing: Vec<ServerMessage> = tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => vec![session.handle_text(text.as_str()).await],
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(observer = %session.id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            notice = outbox.recv() => match notice {
                Some(notice) => vec![notice.into()],
                None => break,
            },
            _ = resync.tick() => session
                .leagues()
                .iter()
                .map(|&league_id| ServerMessage::Resync { league_id })
                .collect(),
        };

        for message in &outgoing {
            if let Err(e) = send(&mut sender, message).await {
                debug!(observer = %session.id, error = %e, "WebSocket send failed");
                info!(observer = %session.id, "WebSocket disconnected");
                return;
            }
        }
    }

    info!(observer = %session.id, "WebSocket disconnected");
}

async fn handle_socket(socket: WebSocket, state: AppState, caller_id: Uuid) {
    let (sender, receiver) = socket.split();
    let (session, outbox) = ObserverSession::connect(
        Arc::clone(&state.topics),
        Arc::clone(&state.draft_repository),
        caller_id,
    );
    run_observer(session, outbox, sender, receiver, state.resync_interval).await;
}

/// GET /api/v1/ws
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, caller))
}

/// Returns the router for the observer endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/ws", get(ws_handler))
}
