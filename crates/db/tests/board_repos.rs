//! Integration tests for the board repositories.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL` and are
//! ignored by default. Run with `cargo test -p boardsync-db -- --ignored`.

use boardsync_core::action::LoggedAction;
use boardsync_db::models::action_record::NewActionRecord;
use boardsync_db::repositories::{ActionRecordRepo, BoardMemberRepo, BoardObjectRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Test: membership lookups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn membership_add_is_idempotent_and_remove_revokes(pool: PgPool) {
    assert!(!BoardMemberRepo::is_member(&pool, 1, 10).await.unwrap());

    BoardMemberRepo::add(&pool, 1, 10).await.unwrap();
    BoardMemberRepo::add(&pool, 1, 10).await.unwrap();
    assert!(BoardMemberRepo::is_member(&pool, 1, 10).await.unwrap());
    assert!(!BoardMemberRepo::is_member(&pool, 2, 10).await.unwrap());

    assert!(BoardMemberRepo::remove(&pool, 1, 10).await.unwrap());
    assert!(!BoardMemberRepo::remove(&pool, 1, 10).await.unwrap());
    assert!(!BoardMemberRepo::is_member(&pool, 1, 10).await.unwrap());
}

// ---------------------------------------------------------------------------
// Test: soft-deleted objects are hidden from list_active
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_active_hides_soft_deleted_objects(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let a = BoardObjectRepo::insert(&mut conn, 1, "a", "shape", &json!({"x": 1}), 7)
        .await
        .unwrap();
    let b = BoardObjectRepo::insert(&mut conn, 1, "b", "text", &json!({"t": "hi"}), 7)
        .await
        .unwrap();
    BoardObjectRepo::write_state(&mut conn, b.id, false, &b.payload, 8)
        .await
        .unwrap();
    drop(conn);

    let active = BoardObjectRepo::list_active(&pool, 1).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, a.id);

    let hidden = BoardObjectRepo::find_by_instance(&pool, 1, "b")
        .await
        .unwrap()
        .expect("soft-deleted row must still exist");
    assert!(!hidden.is_active);
    assert_eq!(hidden.last_edited_by, 8);
}

// ---------------------------------------------------------------------------
// Test: (instance_id, board_id) is unique
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn instance_id_is_unique_per_board(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    BoardObjectRepo::insert(&mut conn, 1, "a", "shape", &json!({}), 7)
        .await
        .unwrap();
    BoardObjectRepo::insert(&mut conn, 2, "a", "shape", &json!({}), 7)
        .await
        .expect("same instance id on another board is allowed");

    let err = BoardObjectRepo::insert(&mut conn, 1, "a", "shape", &json!({}), 7)
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("should be a database error");
    assert_eq!(db_err.constraint(), Some("uq_board_objects_instance"));
}

// ---------------------------------------------------------------------------
// Test: pointer selection is newest-first per undone flag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn latest_for_update_walks_newest_first(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let object = BoardObjectRepo::insert(&mut tx, 1, "a", "shape", &json!({"x": 1}), 7)
        .await
        .unwrap();

    let add = LoggedAction::Add { after: json!({"x": 1}) };
    let update = LoggedAction::Update {
        before: json!({"x": 1}),
        after: json!({"x": 2}),
    };
    let first = ActionRecordRepo::insert(
        &mut tx,
        &NewActionRecord {
            board_id: 1,
            user_id: 7,
            object_id: object.id,
            action: &add,
        },
    )
    .await
    .unwrap();
    let second = ActionRecordRepo::insert(
        &mut tx,
        &NewActionRecord {
            board_id: 1,
            user_id: 7,
            object_id: object.id,
            action: &update,
        },
    )
    .await
    .unwrap();
    assert_eq!(second.logged_action().unwrap(), update);

    let latest = ActionRecordRepo::latest_for_update(&mut tx, 1, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second.id);

    ActionRecordRepo::set_undone(&mut tx, second.id, true)
        .await
        .unwrap();
    let latest = ActionRecordRepo::latest_for_update(&mut tx, 1, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, first.id);

    let redo = ActionRecordRepo::latest_for_update(&mut tx, 1, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(redo.id, second.id);
    tx.commit().await.unwrap();

    let log = ActionRecordRepo::list_for_board(&pool, 1, 10).await.unwrap();
    assert_eq!(
        log.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
}

// ---------------------------------------------------------------------------
// Test: the snapshot check constraint rejects malformed entries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn snapshot_constraint_rejects_add_with_before(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let object = BoardObjectRepo::insert(&mut conn, 1, "a", "shape", &json!({}), 7)
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO board_actions \
            (board_id, user_id, object_id, action_type, state_before, state_after) \
         VALUES (1, 7, $1, 'ADD', '{}'::jsonb, '{}'::jsonb)",
    )
    .bind(object.id)
    .execute(&mut *conn)
    .await;

    assert!(result.is_err());
}
