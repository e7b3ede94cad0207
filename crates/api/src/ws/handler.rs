use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use boardsync_core::action::MutationRequest;
use boardsync_core::collaboration::BoardMessage;
use boardsync_core::types::DbId;
use boardsync_events::BoardTopic;
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::middleware::auth::WsAuthUser;
use crate::state::AppState;
use crate::ws::subscription::spawn_forwarder;

/// Error code for frames that are not a valid client message.
const INVALID_MESSAGE_CODE: &str = "INVALID_MESSAGE";

/// GET /api/v1/ws?token=<jwt>
///
/// Authenticates from the query string, then upgrades. The extractor order
/// matters: a bad token is a 401 even without upgrade headers.
pub async fn ws_handler(
    auth: WsAuthUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth.user_id))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink and stream, then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that drains the manager channel into the sink.
///   3. Dispatches inbound frames on the current task.
///   4. Aborts subscription forwarders and deregisters on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), user_id).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let mut session = Session {
        state: &state,
        conn_id: &conn_id,
        user_id,
        subscriptions: HashMap::new(),
    };

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(reply) = session.dispatch(text.as_str()).await {
                    state.ws_manager.send_board_message(&conn_id, &reply).await;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    session.close();
    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// Per-connection protocol state.
struct Session<'a> {
    state: &'a AppState,
    conn_id: &'a str,
    user_id: DbId,
    /// Board id to its delta forwarder.
    subscriptions: HashMap<DbId, JoinHandle<()>>,
}

impl Session<'_> {
    /// Handle one client frame. Returns the direct reply, if any.
    ///
    /// Successful mutations and undo/redo steps get no direct reply; their
    /// deltas arrive through the board subscription.
    async fn dispatch(&mut self, text: &str) -> Option<BoardMessage> {
        let message = match serde_json::from_str::<BoardMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(conn_id = %self.conn_id, error = %e, "Unparseable WebSocket frame");
                return Some(invalid(format!("Unrecognized message: {e}")));
            }
        };

        match message {
            BoardMessage::Subscribe { board_id } => Some(self.subscribe(board_id).await),
            BoardMessage::Unsubscribe { board_id } => {
                if let Some(task) = self.subscriptions.remove(&board_id) {
                    task.abort();
                    tracing::debug!(conn_id = %self.conn_id, board_id, "Unsubscribed from board");
                }
                None
            }
            BoardMessage::Action {
                board_id,
                action_type,
                instance_id,
                object_type,
                payload,
            } => {
                let request = MutationRequest {
                    board_id,
                    user_id: self.user_id,
                    action_type,
                    instance_id,
                    object_type,
                    payload,
                };
                match self.state.sync.submit_action(request).await {
                    Ok(_) => None,
                    Err(e) => Some(error_message(e)),
                }
            }
            BoardMessage::Undo { board_id } => {
                match self.state.sync.undo(board_id, self.user_id).await {
                    Ok(Some(_)) => None,
                    Ok(None) => Some(BoardMessage::Noop { board_id }),
                    Err(e) => Some(error_message(e)),
                }
            }
            BoardMessage::Redo { board_id } => {
                match self.state.sync.redo(board_id, self.user_id).await {
                    Ok(Some(_)) => None,
                    Ok(None) => Some(BoardMessage::Noop { board_id }),
                    Err(e) => Some(error_message(e)),
                }
            }
            BoardMessage::Subscribed { .. }
            | BoardMessage::Delta { .. }
            | BoardMessage::Noop { .. }
            | BoardMessage::Error { .. } => Some(invalid("Server-only message type".to_string())),
        }
    }

    async fn subscribe(&mut self, board_id: DbId) -> BoardMessage {
        if let Err(e) = self.state.sync.check_member(board_id, self.user_id).await {
            return error_message(e);
        }

        if !self.subscriptions.contains_key(&board_id) {
            let rx = self.state.bus.subscribe(BoardTopic(board_id));
            let task = spawn_forwarder(
                self.state.ws_manager.clone(),
                self.conn_id.to_string(),
                board_id,
                rx,
            );
            self.subscriptions.insert(board_id, task);
            tracing::debug!(conn_id = %self.conn_id, board_id, "Subscribed to board");
        }

        BoardMessage::Subscribed { board_id }
    }

    fn close(self) {
        for (_, task) in self.subscriptions {
            task.abort();
        }
    }
}

fn error_message(err: impl Into<AppError>) -> BoardMessage {
    let (_, code, message) = err.into().classify();
    BoardMessage::Error {
        code: code.to_string(),
        message,
    }
}

fn invalid(message: String) -> BoardMessage {
    BoardMessage::Error {
        code: INVALID_MESSAGE_CODE.to_string(),
        message,
    }
}
