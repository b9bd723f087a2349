//! WebSocket subscription lifecycle — one connection per open session view.
//!
//! The upgrade handler resolves the session and the acting user, then the
//! session loop:
//!
//! 1. Subscribes the connection to the session's channel
//! 2. Sends one full-state snapshot frame (reconnect = full reload)
//! 3. Forwards broadcast frames and direct replies to the socket
//! 4. Dispatches incoming command frames to the action handlers
//! 5. Pings periodically and disconnects unresponsive clients
//! 6. Unsubscribes on close, which promptly stops further deliveries

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use tally_channel::message::Origin;
use tally_channel::subscriber::Subscriber;
use tally_core::ids::ConnectionId;
use tally_core::session::Session;
use tally_core::user::User;

use crate::actions::{ActionError, SessionActions};
use crate::protocol::{self, ClientCommand};
use crate::server::AppState;

/// Display name used for chat from unauthenticated contexts.
const ANONYMOUS: &str = "anonymous";

/// GET /session/{code}/ws — upgrade and run the session view.
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let session = match state.actions.find_session(&code) {
        Ok(session) => session,
        Err(ActionError::NotFound(e)) => {
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
        Err(e) => {
            warn!(code, error = %e, "failed to load session for upgrade");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    let actor = state.identity.current_actor(&headers);
    ws.on_upgrade(move |socket| run_session_view(socket, state, session, actor))
}

/// Run one connection from subscribe through disconnect.
#[instrument(skip_all, fields(code = %session.code))]
async fn run_session_view(
    socket: WebSocket,
    state: AppState,
    session: Session,
    actor: Option<User>,
) {
    let code = session.code.clone();
    let connection_id = ConnectionId::new();
    let origin = match &actor {
        Some(user) => Origin::User(user.id.clone()),
        None => Origin::Connection(connection_id.clone()),
    };
    let author_name = actor
        .as_ref()
        .map_or(ANONYMOUS, User::display_name)
        .to_owned();

    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::channel::<Arc<String>>(state.config.queue_capacity);
    let subscriber = Arc::new(Subscriber::new(
        connection_id.clone(),
        origin.clone(),
        tx,
    ));
    let _ = state.actions.registry().subscribe(&code, subscriber.clone());

    info!(conn = %connection_id, "session view opened");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);

    // Full state first; anything broadcast since the subscribe is queued
    // behind it and applied on top.
    let snapshot = protocol::snapshot_frame(&session).to_string();
    if ws_tx.send(WsMessage::Text(snapshot.into())).await.is_err() {
        state.actions.registry().unsubscribe(&code, &connection_id);
        gauge!("ws_connections_active").decrement(1.0);
        return;
    }

    let alive = Arc::new(AtomicBool::new(true));
    let last_pong = Arc::new(Mutex::new(Instant::now()));

    // Outbound forwarder with periodic pings.
    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    let outbound_alive = Arc::clone(&alive);
    let outbound_pong = Arc::clone(&last_pong);
    let outbound = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        let _ = ticker.tick().await;
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(WsMessage::Text((*text).clone().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !outbound_alive.swap(false, Ordering::Relaxed)
                        && outbound_pong.lock().elapsed() > pong_timeout
                    {
                        warn!("client unresponsive, disconnecting");
                        break;
                    }
                    if ws_tx.send(WsMessage::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound command loop.
    while let Some(Ok(frame)) = ws_rx.next().await {
        let text = match frame {
            WsMessage::Text(ref t) => t.to_string(),
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                alive.store(true, Ordering::Relaxed);
                *last_pong.lock() = Instant::now();
                continue;
            }
            WsMessage::Close(_) => {
                debug!(conn = %connection_id, "client sent close frame");
                break;
            }
            WsMessage::Binary(_) => continue,
        };

        let reply = match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => dispatch(
                &state.actions,
                &code,
                actor.as_ref(),
                &origin,
                &author_name,
                command,
            ),
            Err(e) => protocol::parse_error_frame(&e.to_string()),
        };
        if !subscriber.send(Arc::new(reply.to_string())) {
            debug!(conn = %connection_id, "failed to enqueue reply");
        }
    }

    info!(conn = %connection_id, "session view closed");
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    state.actions.registry().unsubscribe(&code, &connection_id);
    outbound.abort();
}

/// Run one parsed command against the action handlers and build the reply
/// frame for the acting client.
fn dispatch(
    actions: &SessionActions,
    code: &str,
    actor: Option<&User>,
    origin: &Origin,
    author_name: &str,
    command: ClientCommand,
) -> serde_json::Value {
    let action = command.action_name();
    let result = match command {
        ClientCommand::Chat { message } => actions
            .send_chat(origin.clone(), author_name, code, &message)
            .map(|_| None),
        ClientCommand::AddItem { title, description } => match actor {
            Some(actor) => actions
                .add_item(actor, code, &title, &description)
                .map(Some),
            None => Err(sign_in_required()),
        },
        ClientCommand::EditItem {
            id,
            title,
            description,
        } => match actor {
            Some(actor) => actions
                .edit_item(actor, code, &id, &title, &description)
                .map(Some),
            None => Err(sign_in_required()),
        },
        ClientCommand::RemoveItem { id } => match actor {
            Some(actor) => actions.remove_item(actor, code, &id).map(Some),
            None => Err(sign_in_required()),
        },
        ClientCommand::ApproveEstimate { id, value } => match actor {
            Some(actor) => actions
                .approve_estimate(actor, code, &id, &value)
                .map(|_| None),
            None => Err(sign_in_required()),
        },
    };
    match result {
        Ok(item) => protocol::ack_frame(action, item.as_ref()),
        Err(err) => protocol::error_frame(action, &err),
    }
}

fn sign_in_required() -> ActionError {
    ActionError::Forbidden("sign in required".into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tally_channel::registry::ChannelRegistry;
    use tally_core::ids::UserId;
    use tally_store::MemoryRepository;

    fn actions() -> SessionActions {
        SessionActions::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(ChannelRegistry::new()),
            10,
        )
    }

    fn moderator() -> User {
        User::new(UserId::from("mod"), "mod", "Moderator")
    }

    #[tokio::test]
    async fn dispatch_chat_acks() {
        let actions = actions();
        let session = actions
            .create_session(&moderator(), "S", "", "1h")
            .unwrap();
        let reply = dispatch(
            &actions,
            &session.code,
            None,
            &Origin::Connection(ConnectionId::from("c1")),
            ANONYMOUS,
            ClientCommand::Chat {
                message: "hi".into(),
            },
        );
        assert_eq!(reply["type"], "ack");
        assert_eq!(reply["action"], "chat");
    }

    #[tokio::test]
    async fn dispatch_add_item_returns_item_in_ack() {
        let actions = actions();
        let moderator = moderator();
        let session = actions
            .create_session(&moderator, "S", "", "1h")
            .unwrap();
        let reply = dispatch(
            &actions,
            &session.code,
            Some(&moderator),
            &Origin::User(moderator.id.clone()),
            moderator.display_name(),
            ClientCommand::AddItem {
                title: "Login page".into(),
                description: String::new(),
            },
        );
        assert_eq!(reply["type"], "ack");
        assert_eq!(reply["action"], "addItem");
        assert_eq!(reply["item"]["title"], "Login page");
    }

    #[tokio::test]
    async fn dispatch_item_ops_require_identity() {
        let actions = actions();
        let session = actions
            .create_session(&moderator(), "S", "", "1h")
            .unwrap();
        let reply = dispatch(
            &actions,
            &session.code,
            None,
            &Origin::Connection(ConnectionId::from("c1")),
            ANONYMOUS,
            ClientCommand::AddItem {
                title: "t".into(),
                description: String::new(),
            },
        );
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["error"], "forbidden");
    }

    #[tokio::test]
    async fn dispatch_validation_error_is_local_reply() {
        let actions = actions();
        let moderator = moderator();
        let session = actions
            .create_session(&moderator, "S", "", "1h")
            .unwrap();
        let reply = dispatch(
            &actions,
            &session.code,
            Some(&moderator),
            &Origin::User(moderator.id.clone()),
            moderator.display_name(),
            ClientCommand::AddItem {
                title: "   ".into(),
                description: String::new(),
            },
        );
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["error"], "validation");
    }

    #[tokio::test]
    async fn dispatch_approve_estimate_acks_without_item() {
        let actions = actions();
        let moderator = moderator();
        let session = actions
            .create_session(&moderator, "S", "", "1h 2h")
            .unwrap();
        let item = actions
            .add_item(&moderator, &session.code, "x", "")
            .unwrap();
        let alice = User::new(UserId::from("alice"), "alice", "Alice");
        let reply = dispatch(
            &actions,
            &session.code,
            Some(&alice),
            &Origin::User(alice.id.clone()),
            alice.display_name(),
            ClientCommand::ApproveEstimate {
                id: item.id,
                value: "2h".into(),
            },
        );
        assert_eq!(reply["type"], "ack");
        assert_eq!(reply["action"], "approveEstimate");
        assert!(reply.get("item").is_none());
    }

    #[tokio::test]
    async fn dispatch_malformed_estimate_reports_format_error() {
        let actions = actions();
        let moderator = moderator();
        let session = actions
            .create_session(&moderator, "S", "", "1h")
            .unwrap();
        let item = actions
            .add_item(&moderator, &session.code, "x", "")
            .unwrap();
        let reply = dispatch(
            &actions,
            &session.code,
            Some(&moderator),
            &Origin::User(moderator.id.clone()),
            moderator.display_name(),
            ClientCommand::ApproveEstimate {
                id: item.id,
                value: "whenever".into(),
            },
        );
        assert_eq!(reply["error"], "format");
    }
}
