use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Access denied: user {user_id} is not a member of board {board_id}")]
    AccessDenied { board_id: DbId, user_id: DbId },

    #[error("Object not found: '{instance_id}' on board {board_id}")]
    ObjectNotFound { board_id: DbId, instance_id: String },

    #[error("Object already exists: '{instance_id}' on board {board_id}")]
    ObjectExists { board_id: DbId, instance_id: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Board {board_id} is busy: lock not acquired within {waited_ms} ms")]
    Busy { board_id: DbId, waited_ms: u64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
