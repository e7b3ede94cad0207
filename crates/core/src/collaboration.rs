//! Real-time board collaboration message protocol.
//!
//! This module lives in `core` (zero internal deps) so that the WebSocket
//! handler, the sync services, and test clients all reference the same
//! message shapes.

use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::delta::BoardDelta;
use crate::types::DbId;

/// Messages exchanged over WebSocket for board collaboration.
///
/// Serialized as JSON with an internally-tagged `"type"` discriminator so
/// that the frontend can route messages by type string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum BoardMessage {
    /// Client sends: start receiving deltas for a board.
    #[serde(rename = "board.subscribe")]
    Subscribe { board_id: DbId },

    /// Client sends: stop receiving deltas for a board.
    #[serde(rename = "board.unsubscribe")]
    Unsubscribe { board_id: DbId },

    /// Client sends: apply a mutation.
    #[serde(rename = "board.action")]
    Action {
        board_id: DbId,
        action_type: ActionType,
        instance_id: String,
        #[serde(default)]
        object_type: Option<String>,
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },

    /// Client sends: undo the latest action on a board.
    #[serde(rename = "board.undo")]
    Undo { board_id: DbId },

    /// Client sends: redo the latest undone action on a board.
    #[serde(rename = "board.redo")]
    Redo { board_id: DbId },

    /// Server sends: subscription confirmed.
    #[serde(rename = "board.subscribed")]
    Subscribed { board_id: DbId },

    /// Server broadcasts: an object changed.
    #[serde(rename = "board.delta")]
    Delta { delta: BoardDelta },

    /// Server sends to the requesting client: undo/redo had nothing to do.
    #[serde(rename = "board.noop")]
    Noop { board_id: DbId },

    /// Server sends to the requesting client: the request failed.
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl BoardMessage {
    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> String {
        // Every variant is plain data; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
