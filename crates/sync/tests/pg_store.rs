//! `PgBoardStore` against a real database.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL` and are
//! ignored by default. Run with `cargo test -p boardsync-sync -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use boardsync_core::action::{ActionType, MutationRequest};
use boardsync_core::error::CoreError;
use boardsync_core::undo::HistoryDirection;
use boardsync_db::repositories::{ActionRecordRepo, BoardMemberRepo, BoardObjectRepo};
use boardsync_events::BoardBus;
use boardsync_sync::{BoardStore, BoardSync, PgBoardStore, PgMembershipGuard, SyncError};
use serde_json::json;
use sqlx::PgPool;

const BOARD: i64 = 1;
const ALICE: i64 = 10;

fn request(
    action_type: ActionType,
    instance_id: &str,
    payload: Option<serde_json::Value>,
) -> MutationRequest {
    MutationRequest {
        board_id: BOARD,
        user_id: ALICE,
        action_type,
        instance_id: instance_id.to_string(),
        object_type: Some("shape".to_string()),
        payload,
    }
}

fn store(pool: &PgPool) -> PgBoardStore {
    PgBoardStore::new(pool.clone(), Duration::from_secs(3))
}

// ---------------------------------------------------------------------------
// Test: ADD, UPDATE, undo, undo, then nothing left
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn add_update_then_undo_walks_back_to_empty(pool: PgPool) {
    BoardMemberRepo::add(&pool, BOARD, ALICE).await.unwrap();
    let sync = BoardSync::new(
        Arc::new(store(&pool)),
        Arc::new(PgMembershipGuard::new(pool.clone())),
        Arc::new(BoardBus::default()),
        Duration::from_secs(3),
    );

    sync.submit_action(request(ActionType::Add, "a", Some(json!({"x": 1}))))
        .await
        .unwrap();
    sync.submit_action(request(ActionType::Update, "a", Some(json!({"x": 2}))))
        .await
        .unwrap();

    let first = sync.undo(BOARD, ALICE).await.unwrap().expect("undo of UPDATE");
    assert_eq!(first.kind, ActionType::Update);
    assert_eq!(first.payload, Some(json!({"x": 1})));

    let second = sync.undo(BOARD, ALICE).await.unwrap().expect("undo of ADD");
    assert_eq!(second.kind, ActionType::Delete);
    assert_eq!(second.payload, None);

    assert!(sync.undo(BOARD, ALICE).await.unwrap().is_none());
    assert!(sync.board_state(BOARD, ALICE).await.unwrap().is_empty());

    let log = sync.history(BOARD, ALICE, None).await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|entry| entry.undone));
}

// ---------------------------------------------------------------------------
// Test: undo of DELETE reactivates with the pre-delete payload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn undo_delete_reactivates_with_previous_payload(pool: PgPool) {
    let store = store(&pool);
    let added = store
        .apply_mutation(&request(ActionType::Add, "c", Some(json!({"r": 5}))))
        .await
        .unwrap();
    store
        .apply_mutation(&request(ActionType::Delete, "c", None))
        .await
        .unwrap();
    assert!(store.active_objects(BOARD).await.unwrap().is_empty());

    let step = store
        .step_history(BOARD, ALICE, HistoryDirection::Undo)
        .await
        .unwrap()
        .unwrap();
    assert!(step.action.undone);
    let delta = step.delta.expect("undo of DELETE is visible");
    assert_eq!(delta.kind, ActionType::Add);
    assert_eq!(delta.payload, Some(json!({"r": 5})));

    let active = store.active_objects(BOARD).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, added.object.id);
    assert_eq!(active[0].payload, json!({"r": 5}));
}

// ---------------------------------------------------------------------------
// Test: redo of an UPDATE on a deleted object flips the flag only
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn redo_of_update_on_deleted_object_is_silent(pool: PgPool) {
    let store = store(&pool);
    store
        .apply_mutation(&request(ActionType::Add, "a", Some(json!({"x": 1}))))
        .await
        .unwrap();
    store
        .apply_mutation(&request(ActionType::Update, "a", Some(json!({"x": 2}))))
        .await
        .unwrap();
    store
        .step_history(BOARD, ALICE, HistoryDirection::Undo)
        .await
        .unwrap()
        .unwrap();
    store
        .apply_mutation(&request(ActionType::Delete, "a", None))
        .await
        .unwrap();

    let redo = store
        .step_history(BOARD, ALICE, HistoryDirection::Redo)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(redo.action.action_type, "UPDATE");
    assert!(!redo.action.undone);
    assert!(redo.delta.is_none());

    let object = BoardObjectRepo::find_by_instance(&pool, BOARD, "a")
        .await
        .unwrap()
        .unwrap();
    assert!(!object.is_active);
    assert_eq!(object.payload, json!({"x": 1}));
}

// ---------------------------------------------------------------------------
// Test: a failed log insert rolls back the object write
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_log_insert_leaves_no_object(pool: PgPool) {
    sqlx::raw_sql(
        "CREATE FUNCTION reject_board_actions() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'log unavailable'; END; $$ LANGUAGE plpgsql; \
         CREATE TRIGGER trg_reject_board_actions BEFORE INSERT ON board_actions \
         FOR EACH ROW EXECUTE FUNCTION reject_board_actions();",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = store(&pool);
    let err = store
        .apply_mutation(&request(ActionType::Add, "a", Some(json!({"x": 1}))))
        .await
        .unwrap_err();
    assert_matches!(err, SyncError::Storage(_));

    assert!(BoardObjectRepo::find_by_instance(&pool, BOARD, "a")
        .await
        .unwrap()
        .is_none());
    assert!(ActionRecordRepo::list_for_board(&pool, BOARD, 10)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: a board locked by another process fails with Busy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn board_held_elsewhere_fails_busy(pool: PgPool) {
    let mut holder = pool.begin().await.unwrap();
    ActionRecordRepo::lock_board(&mut holder, BOARD, 1000)
        .await
        .unwrap();

    let store = PgBoardStore::new(pool.clone(), Duration::from_millis(100));
    let err = store
        .apply_mutation(&request(ActionType::Add, "a", Some(json!({}))))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        SyncError::Core(CoreError::Busy { board_id: BOARD, waited_ms: 100 })
    );

    let err = store
        .step_history(BOARD, ALICE, HistoryDirection::Undo)
        .await
        .unwrap_err();
    assert_matches!(err, SyncError::Core(CoreError::Busy { .. }));

    holder.rollback().await.unwrap();
    store
        .apply_mutation(&request(ActionType::Add, "a", Some(json!({}))))
        .await
        .unwrap();
}
