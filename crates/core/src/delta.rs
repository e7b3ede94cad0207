//! Board-state deltas: the minimal description of a change that is fanned
//! out to every subscriber of a board.

use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::types::DbId;

/// Actor string attached to every delta produced by undo or redo.
pub const SYSTEM_UNDO_REDO_ACTOR: &str = "system-undo-redo";

/// Who caused a delta.
///
/// Serialized untagged: a user is a bare number, the system is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaActor {
    User(DbId),
    System(String),
}

impl DeltaActor {
    /// The actor used for undo/redo deltas.
    pub fn undo_redo() -> Self {
        Self::System(SYSTEM_UNDO_REDO_ACTOR.to_string())
    }
}

/// A single object state change on a board.
///
/// `kind` tells clients how to apply it: ADD inserts (or revives) the
/// object, UPDATE replaces its payload, DELETE removes it. A DELETE delta
/// is a tombstone and always carries `payload: null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDelta {
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub board_id: DbId,
    pub instance_id: String,
    pub object_type: String,
    pub payload: Option<serde_json::Value>,
    pub actor: DeltaActor,
    /// The log entry this delta originates from.
    pub action_id: DbId,
}

impl BoardDelta {
    pub fn is_tombstone(&self) -> bool {
        self.kind == ActionType::Delete
    }
}
