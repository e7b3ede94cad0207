//! Action log entry model.

use boardsync_core::action::{ActionType, LoggedAction};
use boardsync_core::error::CoreError;
use boardsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `board_actions` table.
///
/// Everything except `undone` is frozen at insert time.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ActionRecord {
    pub id: DbId,
    pub board_id: DbId,
    pub user_id: DbId,
    pub object_id: DbId,
    pub action_type: String,
    pub state_before: Option<serde_json::Value>,
    pub state_after: Option<serde_json::Value>,
    pub undone: bool,
    pub created_at: Timestamp,
}

impl ActionRecord {
    pub fn kind(&self) -> Result<ActionType, CoreError> {
        ActionType::from_name(&self.action_type)
            .map_err(|e| CoreError::Internal(format!("action {}: {e}", self.id)))
    }

    /// Rebuild the typed before/after snapshots of this entry.
    pub fn logged_action(&self) -> Result<LoggedAction, CoreError> {
        LoggedAction::from_parts(
            self.kind()?,
            self.state_before.clone(),
            self.state_after.clone(),
        )
    }
}

/// Fields of a new log entry.
#[derive(Debug, Clone)]
pub struct NewActionRecord<'a> {
    pub board_id: DbId,
    pub user_id: DbId,
    pub object_id: DbId,
    pub action: &'a LoggedAction,
}
