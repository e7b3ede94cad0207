//! PostgreSQL-backed [`BoardStore`].
//!
//! Every operation runs in one transaction whose first statement takes the
//! board's advisory lock, so processes sharing the database serialize per
//! board even without the in-process [`crate::BoardLocks`]. Lock waits are
//! bounded by the store's lock timeout and surface as [`CoreError::Busy`].

use std::time::Duration;

use async_trait::async_trait;
use boardsync_core::action::{plan_mutation, MutationRequest, ObjectWrite};
use boardsync_core::error::CoreError;
use boardsync_core::types::DbId;
use boardsync_core::undo::{apply_restore, plan_reversal, HistoryDirection};
use boardsync_db::models::action_record::{ActionRecord, NewActionRecord};
use boardsync_db::models::board_object::BoardObject;
use boardsync_db::repositories::action_record_repo::LOCK_NOT_AVAILABLE;
use boardsync_db::repositories::{ActionRecordRepo, BoardObjectRepo};
use boardsync_db::DbPool;

use crate::error::SyncError;
use crate::store::{mutation_delta, reversal_delta, AppliedMutation, BoardStore, HistoryStep};

fn require_existing(existing: Option<&BoardObject>) -> Result<&BoardObject, CoreError> {
    existing.ok_or_else(|| CoreError::Internal("planned write targets a missing object".into()))
}

pub struct PgBoardStore {
    pool: DbPool,
    lock_timeout_ms: u64,
}

impl PgBoardStore {
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self {
            pool,
            lock_timeout_ms: u64::try_from(lock_timeout.as_millis())
                .unwrap_or(u64::MAX)
                .max(1),
        }
    }

    /// Turn an expired database lock wait into `Busy`.
    fn busy_on_lock_timeout(&self, board_id: DbId, err: SyncError) -> SyncError {
        match err {
            SyncError::Storage(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) =>
            {
                tracing::warn!(
                    board_id,
                    waited_ms = self.lock_timeout_ms,
                    "Board lock wait timed out in database",
                );
                CoreError::Busy {
                    board_id,
                    waited_ms: self.lock_timeout_ms,
                }
                .into()
            }
            other => other,
        }
    }

    async fn apply_mutation_tx(
        &self,
        request: &MutationRequest,
    ) -> Result<AppliedMutation, SyncError> {
        let mut tx = self.pool.begin().await?;
        ActionRecordRepo::lock_board(&mut *tx, request.board_id, self.lock_timeout_ms).await?;

        let existing = BoardObjectRepo::find_by_instance_for_update(
            &mut *tx,
            request.board_id,
            &request.instance_id,
        )
        .await?;
        let snapshot = existing.as_ref().map(BoardObject::snapshot);
        let plan = plan_mutation(request, snapshot.as_ref())?;

        let object = match plan.write {
            ObjectWrite::Create {
                object_type,
                payload,
            } => {
                BoardObjectRepo::insert(
                    &mut *tx,
                    request.board_id,
                    &request.instance_id,
                    &object_type,
                    &payload,
                    request.user_id,
                )
                .await?
            }
            ObjectWrite::Revive { payload } | ObjectWrite::Replace { payload } => {
                let id = require_existing(existing.as_ref())?.id;
                BoardObjectRepo::write_state(&mut *tx, id, true, &payload, request.user_id).await?
            }
            ObjectWrite::Deactivate => {
                let current = require_existing(existing.as_ref())?;
                BoardObjectRepo::write_state(
                    &mut *tx,
                    current.id,
                    false,
                    &current.payload,
                    request.user_id,
                )
                .await?
            }
        };

        let action = ActionRecordRepo::insert(
            &mut *tx,
            &NewActionRecord {
                board_id: request.board_id,
                user_id: request.user_id,
                object_id: object.id,
                action: &plan.action,
            },
        )
        .await?;

        tx.commit().await?;

        let delta = mutation_delta(&object, &action, &plan.action);
        Ok(AppliedMutation {
            object,
            action,
            delta,
        })
    }

    async fn step_history_tx(
        &self,
        board_id: DbId,
        user_id: DbId,
        direction: HistoryDirection,
    ) -> Result<Option<HistoryStep>, SyncError> {
        let mut tx = self.pool.begin().await?;
        ActionRecordRepo::lock_board(&mut *tx, board_id, self.lock_timeout_ms).await?;

        let undone = direction.selects_undone();
        let latest = ActionRecordRepo::latest_for_update(&mut *tx, board_id, undone).await?;
        let Some(mut action) = latest else {
            return Ok(None);
        };
        let logged = action.logged_action()?;

        let object = BoardObjectRepo::find_by_id_for_update(&mut *tx, action.object_id).await?;
        let snapshot = object.as_ref().map(BoardObject::snapshot);
        let plan = plan_reversal(direction, &logged, snapshot.as_ref());

        ActionRecordRepo::set_undone(&mut *tx, action.id, plan.undone).await?;

        let delta = match (object, snapshot, plan.delta) {
            (Some(object), Some(mut state), Some(intent)) => {
                apply_restore(&mut state, &plan.restore);
                let object = BoardObjectRepo::write_state(
                    &mut *tx,
                    object.id,
                    state.is_active,
                    &state.payload,
                    user_id,
                )
                .await?;
                Some(reversal_delta(&object, action.id, intent))
            }
            (None, _, _) => {
                tracing::warn!(
                    board_id,
                    action_id = action.id,
                    object_id = action.object_id,
                    "Log entry references a missing object",
                );
                None
            }
            _ => None,
        };

        tx.commit().await?;

        action.undone = plan.undone;
        Ok(Some(HistoryStep { action, delta }))
    }
}

#[async_trait]
impl BoardStore for PgBoardStore {
    async fn apply_mutation(
        &self,
        request: &MutationRequest,
    ) -> Result<AppliedMutation, SyncError> {
        self.apply_mutation_tx(request)
            .await
            .map_err(|err| self.busy_on_lock_timeout(request.board_id, err))
    }

    async fn step_history(
        &self,
        board_id: DbId,
        user_id: DbId,
        direction: HistoryDirection,
    ) -> Result<Option<HistoryStep>, SyncError> {
        self.step_history_tx(board_id, user_id, direction)
            .await
            .map_err(|err| self.busy_on_lock_timeout(board_id, err))
    }

    async fn active_objects(&self, board_id: DbId) -> Result<Vec<BoardObject>, SyncError> {
        Ok(BoardObjectRepo::list_active(&self.pool, board_id).await?)
    }

    async fn action_log(&self, board_id: DbId, limit: i64) -> Result<Vec<ActionRecord>, SyncError> {
        Ok(ActionRecordRepo::list_for_board(&self.pool, board_id, limit).await?)
    }
}
