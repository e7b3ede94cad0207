#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use boardsync_core::action::{ActionType, MutationRequest};
use boardsync_core::types::DbId;
use boardsync_events::BoardBus;
use boardsync_sync::{BoardSync, InMemoryMembership, MemoryBoardStore};

pub const BOARD: DbId = 1;
pub const OTHER_BOARD: DbId = 2;
pub const ALICE: DbId = 10;
pub const BOB: DbId = 11;
pub const MALLORY: DbId = 99;

/// A `BoardSync` wired to in-memory collaborators.
///
/// Alice and Bob are members of both boards; Mallory of neither.
pub struct Harness {
    pub sync: Arc<BoardSync>,
    pub store: Arc<MemoryBoardStore>,
    pub members: Arc<InMemoryMembership>,
    pub bus: Arc<BoardBus>,
}

pub fn harness() -> Harness {
    harness_with_timeout(Duration::from_secs(3))
}

pub fn harness_with_timeout(lock_timeout: Duration) -> Harness {
    let store = Arc::new(MemoryBoardStore::new());
    let members = Arc::new(InMemoryMembership::new());
    for board in [BOARD, OTHER_BOARD] {
        members.grant(board, ALICE);
        members.grant(board, BOB);
    }
    let bus = Arc::new(BoardBus::default());
    let sync = Arc::new(BoardSync::new(
        store.clone(),
        members.clone(),
        bus.clone(),
        lock_timeout,
    ));
    Harness {
        sync,
        store,
        members,
        bus,
    }
}

pub fn add(
    board_id: DbId,
    user_id: DbId,
    instance_id: &str,
    payload: serde_json::Value,
) -> MutationRequest {
    MutationRequest {
        board_id,
        user_id,
        action_type: ActionType::Add,
        instance_id: instance_id.to_string(),
        object_type: Some("shape".to_string()),
        payload: Some(payload),
    }
}

pub fn update(
    board_id: DbId,
    user_id: DbId,
    instance_id: &str,
    payload: serde_json::Value,
) -> MutationRequest {
    MutationRequest {
        board_id,
        user_id,
        action_type: ActionType::Update,
        instance_id: instance_id.to_string(),
        object_type: None,
        payload: Some(payload),
    }
}

pub fn delete(board_id: DbId, user_id: DbId, instance_id: &str) -> MutationRequest {
    MutationRequest {
        board_id,
        user_id,
        action_type: ActionType::Delete,
        instance_id: instance_id.to_string(),
        object_type: None,
        payload: None,
    }
}
