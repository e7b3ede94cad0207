//! Undo and redo over a board's linear action log.

use std::sync::Arc;

use boardsync_core::delta::BoardDelta;
use boardsync_core::types::DbId;
use boardsync_core::undo::HistoryDirection;
use boardsync_events::{BoardTopic, BroadcastGateway};

use crate::error::SyncError;
use crate::guard::{require_member, MembershipGuard};
use crate::locks::BoardLocks;
use crate::store::BoardStore;

/// Moves the per-board history pointer.
///
/// Undo takes the newest entry not yet undone, redo the newest undone
/// entry. "Nothing to do" is `Ok(None)`. Emitted deltas carry the
/// `system-undo-redo` actor.
pub struct UndoRedoCoordinator {
    store: Arc<dyn BoardStore>,
    guard: Arc<dyn MembershipGuard>,
    gateway: Arc<dyn BroadcastGateway>,
    locks: Arc<BoardLocks>,
}

impl UndoRedoCoordinator {
    pub fn new(
        store: Arc<dyn BoardStore>,
        guard: Arc<dyn MembershipGuard>,
        gateway: Arc<dyn BroadcastGateway>,
        locks: Arc<BoardLocks>,
    ) -> Self {
        Self {
            store,
            guard,
            gateway,
            locks,
        }
    }

    pub async fn undo(
        &self,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<Option<BoardDelta>, SyncError> {
        self.step(board_id, user_id, HistoryDirection::Undo).await
    }

    pub async fn redo(
        &self,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<Option<BoardDelta>, SyncError> {
        self.step(board_id, user_id, HistoryDirection::Redo).await
    }

    async fn step(
        &self,
        board_id: DbId,
        user_id: DbId,
        direction: HistoryDirection,
    ) -> Result<Option<BoardDelta>, SyncError> {
        require_member(self.guard.as_ref(), board_id, user_id).await?;

        let _board = self.locks.acquire(board_id).await?;

        let step = self
            .store
            .step_history(board_id, user_id, direction)
            .await
            .inspect_err(|err| {
                if let SyncError::Storage(e) = err {
                    tracing::error!(
                        board_id,
                        %direction,
                        error = %e,
                        "History step rolled back on storage failure",
                    );
                }
            })?;

        let Some(step) = step else {
            tracing::debug!(board_id, user_id, %direction, "Nothing to {direction}");
            return Ok(None);
        };

        match &step.delta {
            Some(delta) => {
                tracing::info!(
                    board_id,
                    user_id,
                    %direction,
                    action_id = step.action.id,
                    delta_type = %delta.kind,
                    "History step applied",
                );
                self.gateway.publish(BoardTopic(board_id), delta);
            }
            None => tracing::info!(
                board_id,
                user_id,
                %direction,
                action_id = step.action.id,
                "History step had no visible effect",
            ),
        }

        Ok(step.delta)
    }
}
