//! Board object entity model.

use boardsync_core::action::ObjectSnapshot;
use boardsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `board_objects` table.
///
/// Rows are never deleted by the sync core; `is_active = false` marks a
/// soft-deleted object whose payload is kept for undo.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct BoardObject {
    pub id: DbId,
    pub board_id: DbId,
    pub instance_id: String,
    pub object_type: String,
    pub payload: serde_json::Value,
    pub is_active: bool,
    pub created_by: DbId,
    pub last_edited_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BoardObject {
    pub fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            is_active: self.is_active,
            object_type: self.object_type.clone(),
            payload: self.payload.clone(),
        }
    }
}
