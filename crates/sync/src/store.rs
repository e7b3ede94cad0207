//! The persistence seam of the sync services.
//!
//! A [`BoardStore`] performs each mutation or history step as one atomic
//! unit: object write plus log write, or log flag flip plus object write.
//! Either everything commits or nothing is visible. Callers serialize
//! access per board before calling in (see [`crate::BoardLocks`]).

use async_trait::async_trait;
use boardsync_core::action::{LoggedAction, MutationRequest};
use boardsync_core::delta::{BoardDelta, DeltaActor};
use boardsync_core::types::DbId;
use boardsync_core::undo::{DeltaIntent, HistoryDirection};
use boardsync_db::models::action_record::ActionRecord;
use boardsync_db::models::board_object::BoardObject;

use crate::error::SyncError;

/// Outcome of a committed mutation.
#[derive(Debug, Clone)]
pub struct AppliedMutation {
    /// The object row as written.
    pub object: BoardObject,
    /// The appended log entry.
    pub action: ActionRecord,
    pub delta: BoardDelta,
}

/// Outcome of a committed undo or redo step.
///
/// `delta` is `None` when the step flipped the entry's flag but had no
/// visible effect (referenced object missing, or redo of an update on an
/// inactive object).
#[derive(Debug, Clone)]
pub struct HistoryStep {
    /// The selected log entry, with its flag already flipped.
    pub action: ActionRecord,
    pub delta: Option<BoardDelta>,
}

#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Apply a validated mutation and append its log entry.
    async fn apply_mutation(
        &self,
        request: &MutationRequest,
    ) -> Result<AppliedMutation, SyncError>;

    /// Move the board's history pointer one step. `Ok(None)` when no entry
    /// is eligible.
    async fn step_history(
        &self,
        board_id: DbId,
        user_id: DbId,
        direction: HistoryDirection,
    ) -> Result<Option<HistoryStep>, SyncError>;

    /// Active objects of a board, ordered by id.
    async fn active_objects(&self, board_id: DbId) -> Result<Vec<BoardObject>, SyncError>;

    /// Log entries of a board, newest first, at most `limit`.
    async fn action_log(&self, board_id: DbId, limit: i64) -> Result<Vec<ActionRecord>, SyncError>;
}

// ---------------------------------------------------------------------------
// Delta construction shared by store implementations
// ---------------------------------------------------------------------------

/// Delta for a user mutation: the logged type and after-state, attributed
/// to the submitting user.
pub(crate) fn mutation_delta(
    object: &BoardObject,
    action: &ActionRecord,
    logged: &LoggedAction,
) -> BoardDelta {
    BoardDelta {
        kind: logged.action_type(),
        board_id: object.board_id,
        instance_id: object.instance_id.clone(),
        object_type: object.object_type.clone(),
        payload: logged.state_after().cloned(),
        actor: DeltaActor::User(action.user_id),
        action_id: action.id,
    }
}

/// Delta for an undo/redo step, attributed to the system actor.
pub(crate) fn reversal_delta(
    object: &BoardObject,
    action_id: DbId,
    intent: DeltaIntent,
) -> BoardDelta {
    BoardDelta {
        kind: intent.kind,
        board_id: object.board_id,
        instance_id: object.instance_id.clone(),
        object_type: object.object_type.clone(),
        payload: intent.payload,
        actor: DeltaActor::undo_redo(),
        action_id,
    }
}
