//! Board membership model.

use boardsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `board_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoardMember {
    pub board_id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
}
