//! Applying user mutations to a board.

use std::sync::Arc;

use boardsync_core::action::MutationRequest;
use boardsync_core::delta::BoardDelta;
use boardsync_core::error::CoreError;
use boardsync_events::{BoardTopic, BroadcastGateway};

use crate::error::SyncError;
use crate::guard::{require_member, MembershipGuard};
use crate::locks::BoardLocks;
use crate::store::BoardStore;

/// Applies ADD, UPDATE and DELETE requests.
///
/// Order of work: membership, request validation, board guard, store
/// transaction, publish. The guard is released only after the delta has
/// been handed to the gateway.
pub struct MutationService {
    store: Arc<dyn BoardStore>,
    guard: Arc<dyn MembershipGuard>,
    gateway: Arc<dyn BroadcastGateway>,
    locks: Arc<BoardLocks>,
}

impl MutationService {
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

    pub async fn apply(&self, request: MutationRequest) -> Result<BoardDelta, SyncError> {
        require_member(self.guard.as_ref(), request.board_id, request.user_id).await?;

        if let Err(err) = request.validate() {
            log_rejection(&request, &err);
            return Err(err.into());
        }

        let _board = self.locks.acquire(request.board_id).await?;

        let applied = match self.store.apply_mutation(&request).await {
            Ok(applied) => applied,
            Err(err) => {
                match &err {
                    SyncError::Core(core) => log_rejection(&request, core),
                    SyncError::Storage(e) => tracing::error!(
                        board_id = request.board_id,
                        instance_id = %request.instance_id,
                        error = %e,
                        "Mutation rolled back on storage failure",
                    ),
                }
                return Err(err);
            }
        };

        tracing::info!(
            board_id = request.board_id,
            user_id = request.user_id,
            instance_id = %request.instance_id,
            action_id = applied.action.id,
            action_type = %applied.delta.kind,
            "Board mutation applied",
        );

        self.gateway.publish(BoardTopic(request.board_id), &applied.delta);
        Ok(applied.delta)
    }
}

fn log_rejection(request: &MutationRequest, err: &CoreError) {
    match err {
        CoreError::InvalidPayload(reason) => tracing::warn!(
            board_id = request.board_id,
            instance_id = %request.instance_id,
            user_id = request.user_id,
            %reason,
            "Rejected invalid payload",
        ),
        other => tracing::debug!(
            board_id = request.board_id,
            instance_id = %request.instance_id,
            error = %other,
            "Mutation rejected",
        ),
    }
}
