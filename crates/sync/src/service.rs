use std::sync::Arc;
use std::time::Duration;

use boardsync_core::action::MutationRequest;
use boardsync_core::board::clamp_history_limit;
use boardsync_core::delta::BoardDelta;
use boardsync_core::types::DbId;
use boardsync_db::models::action_record::ActionRecord;
use boardsync_db::models::board_object::BoardObject;
use boardsync_events::BroadcastGateway;

use crate::error::SyncError;
use crate::guard::{require_member, MembershipGuard};
use crate::locks::BoardLocks;
use crate::mutation::MutationService;
use crate::store::BoardStore;
use crate::undo_redo::UndoRedoCoordinator;

/// Entry point used by the HTTP and WebSocket layers.
///
/// Both services share one [`BoardLocks`] registry so mutations and
/// history steps on a board are serialized against each other.
pub struct BoardSync {
    mutations: MutationService,
    history: UndoRedoCoordinator,
    store: Arc<dyn BoardStore>,
    guard: Arc<dyn MembershipGuard>,
    locks: Arc<BoardLocks>,
}

impl BoardSync {
    pub fn new(
        store: Arc<dyn BoardStore>,
        guard: Arc<dyn MembershipGuard>,
        gateway: Arc<dyn BroadcastGateway>,
        lock_timeout: Duration,
    ) -> Self {
        let locks = Arc::new(BoardLocks::new(lock_timeout));
        Self {
            mutations: MutationService::new(
                Arc::clone(&store),
                Arc::clone(&guard),
                Arc::clone(&gateway),
                Arc::clone(&locks),
            ),
            history: UndoRedoCoordinator::new(
                Arc::clone(&store),
                Arc::clone(&guard),
                gateway,
                Arc::clone(&locks),
            ),
            store,
            guard,
            locks,
        }
    }

    pub async fn submit_action(&self, request: MutationRequest) -> Result<BoardDelta, SyncError> {
        self.mutations.apply(request).await
    }

    pub async fn undo(
        &self,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<Option<BoardDelta>, SyncError> {
        self.history.undo(board_id, user_id).await
    }

    pub async fn redo(
        &self,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<Option<BoardDelta>, SyncError> {
        self.history.redo(board_id, user_id).await
    }

    /// Active objects of a board.
    pub async fn board_state(
        &self,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<BoardObject>, SyncError> {
        require_member(self.guard.as_ref(), board_id, user_id).await?;
        self.store.active_objects(board_id).await
    }

    /// The board's log, newest first. `limit` defaults to 100, capped at 500.
    pub async fn history(
        &self,
        board_id: DbId,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<ActionRecord>, SyncError> {
        require_member(self.guard.as_ref(), board_id, user_id).await?;
        self.store
            .action_log(board_id, clamp_history_limit(limit))
            .await
    }

    /// Membership check without an operation, for subscriptions.
    pub async fn check_member(&self, board_id: DbId, user_id: DbId) -> Result<(), SyncError> {
        require_member(self.guard.as_ref(), board_id, user_id).await
    }

    pub fn locks(&self) -> &Arc<BoardLocks> {
        &self.locks
    }
}
