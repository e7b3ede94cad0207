//! In-memory [`BoardStore`] with the same semantics as the PostgreSQL one.
//!
//! Used by the test suites and for running the server without a database.
//! Each operation plans first and mutates only once the plan succeeded, all
//! under a single mutex, so a failed operation leaves no trace.

use std::collections::HashMap;

use async_trait::async_trait;
use boardsync_core::action::{plan_mutation, MutationRequest, ObjectWrite};
use boardsync_core::error::CoreError;
use boardsync_core::types::{DbId, Timestamp};
use boardsync_core::undo::{apply_restore, plan_reversal, HistoryDirection};
use boardsync_db::models::action_record::ActionRecord;
use boardsync_db::models::board_object::BoardObject;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::store::{mutation_delta, reversal_delta, AppliedMutation, BoardStore, HistoryStep};

#[derive(Default)]
struct MemoryState {
    /// Indexed by `id - 1`.
    objects: Vec<BoardObject>,
    /// `(board_id, instance_id)` to object id.
    by_instance: HashMap<(DbId, String), DbId>,
    /// Indexed by `id - 1`.
    actions: Vec<ActionRecord>,
    last_timestamp: Option<Timestamp>,
}

impl MemoryState {
    /// Wall-clock time, never earlier than the previous call.
    fn now(&mut self) -> Timestamp {
        let now = match self.last_timestamp {
            Some(last) => Utc::now().max(last),
            None => Utc::now(),
        };
        self.last_timestamp = Some(now);
        now
    }

    fn object(&self, id: DbId) -> Option<&BoardObject> {
        usize::try_from(id - 1).ok().and_then(|i| self.objects.get(i))
    }

    fn object_mut(&mut self, id: DbId) -> Result<&mut BoardObject, CoreError> {
        usize::try_from(id - 1)
            .ok()
            .and_then(|i| self.objects.get_mut(i))
            .ok_or_else(|| CoreError::Internal(format!("object {id} vanished")))
    }

    fn find_by_instance(&self, board_id: DbId, instance_id: &str) -> Option<&BoardObject> {
        self.by_instance
            .get(&(board_id, instance_id.to_string()))
            .and_then(|id| self.object(*id))
    }

    /// Newest entry of a board with the given flag, by timestamp then id.
    fn latest_index(&self, board_id: DbId, undone: bool) -> Option<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.board_id == board_id && a.undone == undone)
            .max_by_key(|(_, a)| (a.created_at, a.id))
            .map(|(i, _)| i)
    }
}

/// A [`BoardStore`] that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryBoardStore {
    state: Mutex<MemoryState>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object by instance id, active or not.
    pub async fn object(&self, board_id: DbId, instance_id: &str) -> Option<BoardObject> {
        self.state
            .lock()
            .await
            .find_by_instance(board_id, instance_id)
            .cloned()
    }
}

#[async_trait]
impl BoardStore for MemoryBoardStore {
    async fn apply_mutation(
        &self,
        request: &MutationRequest,
    ) -> Result<AppliedMutation, SyncError> {
        let mut state = self.state.lock().await;

        let existing = state.find_by_instance(request.board_id, &request.instance_id);
        let existing_id = existing.map(|o| o.id);
        let snapshot = existing.map(BoardObject::snapshot);
        let plan = plan_mutation(request, snapshot.as_ref())?;

        let now = state.now();
        let object = match (plan.write, existing_id) {
            (ObjectWrite::Create { object_type, payload }, _) => {
                let object = BoardObject {
                    id: state.objects.len() as DbId + 1,
                    board_id: request.board_id,
                    instance_id: request.instance_id.clone(),
                    object_type,
                    payload,
                    is_active: true,
                    created_by: request.user_id,
                    last_edited_by: request.user_id,
                    created_at: now,
                    updated_at: now,
                };
                state
                    .by_instance
                    .insert((object.board_id, object.instance_id.clone()), object.id);
                state.objects.push(object.clone());
                object
            }
            (ObjectWrite::Revive { payload } | ObjectWrite::Replace { payload }, Some(id)) => {
                let object = state.object_mut(id)?;
                object.is_active = true;
                object.payload = payload;
                object.last_edited_by = request.user_id;
                object.updated_at = now;
                object.clone()
            }
            (ObjectWrite::Deactivate, Some(id)) => {
                let object = state.object_mut(id)?;
                object.is_active = false;
                object.last_edited_by = request.user_id;
                object.updated_at = now;
                object.clone()
            }
            (_, None) => {
                let err = CoreError::Internal("planned write targets a missing object".into());
                return Err(err.into());
            }
        };

        let action = ActionRecord {
            id: state.actions.len() as DbId + 1,
            board_id: request.board_id,
            user_id: request.user_id,
            object_id: object.id,
            action_type: plan.action.action_type().as_str().to_string(),
            state_before: plan.action.state_before().cloned(),
            state_after: plan.action.state_after().cloned(),
            undone: false,
            created_at: now,
        };
        state.actions.push(action.clone());

        let delta = mutation_delta(&object, &action, &plan.action);
        Ok(AppliedMutation {
            object,
            action,
            delta,
        })
    }

    async fn step_history(
        &self,
        board_id: DbId,
        user_id: DbId,
        direction: HistoryDirection,
    ) -> Result<Option<HistoryStep>, SyncError> {
        let mut state = self.state.lock().await;

        let Some(index) = state.latest_index(board_id, direction.selects_undone()) else {
            return Ok(None);
        };
        let logged = state.actions[index].logged_action()?;
        let object_id = state.actions[index].object_id;

        let snapshot = state.object(object_id).map(BoardObject::snapshot);
        let plan = plan_reversal(direction, &logged, snapshot.as_ref());

        let now = state.now();
        let delta = match (snapshot, plan.delta) {
            (Some(mut restored), Some(intent)) => {
                apply_restore(&mut restored, &plan.restore);
                let object = state.object_mut(object_id)?;
                object.is_active = restored.is_active;
                object.payload = restored.payload;
                object.last_edited_by = user_id;
                object.updated_at = now;
                let object = object.clone();
                Some(reversal_delta(&object, state.actions[index].id, intent))
            }
            _ => None,
        };

        let action = &mut state.actions[index];
        action.undone = plan.undone;
        Ok(Some(HistoryStep {
            action: action.clone(),
            delta,
        }))
    }

    async fn active_objects(&self, board_id: DbId) -> Result<Vec<BoardObject>, SyncError> {
        let state = self.state.lock().await;
        Ok(state
            .objects
            .iter()
            .filter(|o| o.board_id == board_id && o.is_active)
            .cloned()
            .collect())
    }

    async fn action_log(&self, board_id: DbId, limit: i64) -> Result<Vec<ActionRecord>, SyncError> {
        let state = self.state.lock().await;
        let mut log: Vec<ActionRecord> = state
            .actions
            .iter()
            .filter(|a| a.board_id == board_id)
            .cloned()
            .collect();
        log.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        log.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use boardsync_core::action::ActionType;
    use serde_json::json;

    fn request(
        action_type: ActionType,
        instance_id: &str,
        payload: Option<serde_json::Value>,
    ) -> MutationRequest {
        MutationRequest {
            board_id: 1,
            user_id: 7,
            action_type,
            instance_id: instance_id.to_string(),
            object_type: Some("shape".to_string()),
            payload,
        }
    }

    #[tokio::test]
    async fn failed_mutation_leaves_no_trace() {
        let store = MemoryBoardStore::new();
        let err = store
            .apply_mutation(&request(ActionType::Update, "ghost", Some(json!({"x": 1}))))
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::Core(CoreError::ObjectNotFound { .. }));
        assert!(store.action_log(1, 10).await.unwrap().is_empty());
        assert!(store.object(1, "ghost").await.is_none());
    }

    #[tokio::test]
    async fn add_after_delete_revives_same_row() {
        let store = MemoryBoardStore::new();
        let first = store
            .apply_mutation(&request(ActionType::Add, "a", Some(json!({"x": 1}))))
            .await
            .unwrap();
        store
            .apply_mutation(&request(ActionType::Delete, "a", None))
            .await
            .unwrap();
        let revived = store
            .apply_mutation(&request(ActionType::Add, "a", Some(json!({"x": 9}))))
            .await
            .unwrap();

        assert_eq!(revived.object.id, first.object.id);
        assert!(revived.object.is_active);
        assert_eq!(revived.object.payload, json!({"x": 9}));
        assert_eq!(revived.delta.kind, ActionType::Add);
    }

    #[tokio::test]
    async fn action_log_is_newest_first_and_limited() {
        let store = MemoryBoardStore::new();
        for (i, id) in ["a", "b", "c"].into_iter().enumerate() {
            store
                .apply_mutation(&request(ActionType::Add, id, Some(json!({"i": i}))))
                .await
                .unwrap();
        }
        let log = store.action_log(1, 2).await.unwrap();
        assert_eq!(log.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3, 2]);
        assert!(store.action_log(2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redo_of_update_on_deleted_object_is_silent() {
        let store = MemoryBoardStore::new();
        store
            .apply_mutation(&request(ActionType::Add, "a", Some(json!({"x": 1}))))
            .await
            .unwrap();
        store
            .apply_mutation(&request(ActionType::Update, "a", Some(json!({"x": 2}))))
            .await
            .unwrap();

        let undo = store.step_history(1, 7, HistoryDirection::Undo).await.unwrap().unwrap();
        assert_eq!(undo.action.action_type, "UPDATE");
        store
            .apply_mutation(&request(ActionType::Delete, "a", None))
            .await
            .unwrap();

        // The undone UPDATE is the only redo candidate; its object is inactive.
        let redo = store.step_history(1, 7, HistoryDirection::Redo).await.unwrap().unwrap();
        assert!(!redo.action.undone);
        assert!(redo.delta.is_none());
        let object = store.object(1, "a").await.unwrap();
        assert!(!object.is_active);
        assert_eq!(object.payload, json!({"x": 1}));
    }
}
