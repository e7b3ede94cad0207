//! Forwarding a board's deltas to one WebSocket connection.

use std::sync::Arc;

use boardsync_core::collaboration::BoardMessage;
use boardsync_core::delta::BoardDelta;
use boardsync_core::types::DbId;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::ws::manager::WsManager;

/// Error code sent when a subscriber fell behind and deltas were dropped.
pub const LAGGED_CODE: &str = "LAGGED";

/// Spawn a task relaying `rx` to `conn_id` as `board.delta` frames.
///
/// A lagging receiver is told how many deltas it missed so the client can
/// refetch the board's objects; the subscription stays open. The task ends
/// when the connection is gone or the topic closes.
pub fn spawn_forwarder(
    ws_manager: Arc<WsManager>,
    conn_id: String,
    board_id: DbId,
    mut rx: broadcast::Receiver<BoardDelta>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = match rx.recv().await {
                Ok(delta) => BoardMessage::Delta { delta },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        conn_id = %conn_id,
                        board_id,
                        skipped,
                        "Board subscriber lagged",
                    );
                    BoardMessage::Error {
                        code: LAGGED_CODE.to_string(),
                        message: format!(
                            "{skipped} updates for board {board_id} were dropped; refetch its objects"
                        ),
                    }
                }
                Err(RecvError::Closed) => break,
            };

            if !ws_manager.send_board_message(&conn_id, &message).await {
                tracing::debug!(
                    conn_id = %conn_id,
                    board_id,
                    "Connection gone, stopping forwarder",
                );
                break;
            }
        }
    })
}
