//! Integration tests for the board routes, on in-memory storage.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use boardsync_events::BoardTopic;
use common::*;
use serde_json::json;

fn actions(board_id: i64) -> String {
    format!("/api/v1/boards/{board_id}/actions")
}

// ---------------------------------------------------------------------------
// Test: submit, read back, undo, redo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_add_returns_created_delta() {
    let app = build_test_app();

    let response = post_json_as(
        app.router.clone(),
        &actions(BOARD),
        ALICE,
        json!({
            "action_type": "ADD",
            "instance_id": "rect-1",
            "object_type": "rectangle",
            "payload": {"x": 10, "y": 20}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let delta = &json["data"];
    assert_eq!(delta["type"], "ADD");
    assert_eq!(delta["board_id"], BOARD);
    assert_eq!(delta["instance_id"], "rect-1");
    assert_eq!(delta["object_type"], "rectangle");
    assert_eq!(delta["payload"], json!({"x": 10, "y": 20}));
    assert_eq!(delta["actor"], ALICE);
    assert!(delta["action_id"].is_i64());

    let objects = body_json(get_as(app.router, "/api/v1/boards/1/objects", BOB).await).await;
    let objects = objects["data"].as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["instance_id"], "rect-1");
    assert_eq!(objects[0]["created_by"], ALICE);
}

#[tokio::test]
async fn undo_and_redo_return_system_deltas() {
    let app = build_test_app();
    post_json_as(
        app.router.clone(),
        &actions(BOARD),
        ALICE,
        json!({"action_type": "ADD", "instance_id": "a", "object_type": "shape", "payload": {"x": 1}}),
    )
    .await;
    post_json_as(
        app.router.clone(),
        &actions(BOARD),
        ALICE,
        json!({"action_type": "UPDATE", "instance_id": "a", "payload": {"x": 2}}),
    )
    .await;

    let response = post_as(app.router.clone(), "/api/v1/boards/1/undo", BOB).await;
    assert_eq!(response.status(), StatusCode::OK);
    let undo = body_json(response).await;
    assert_eq!(undo["data"]["type"], "UPDATE");
    assert_eq!(undo["data"]["payload"], json!({"x": 1}));
    assert_eq!(undo["data"]["actor"], "system-undo-redo");

    let redo = body_json(post_as(app.router.clone(), "/api/v1/boards/1/redo", BOB).await).await;
    assert_eq!(redo["data"]["type"], "UPDATE");
    assert_eq!(redo["data"]["payload"], json!({"x": 2}));

    let response = get_as(app.router, "/api/v1/boards/1/actions?limit=1", ALICE).await;
    let history = body_json(response).await;
    let history = history["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["action_type"], "UPDATE");
    assert_eq!(history[0]["undone"], false);
}

#[tokio::test]
async fn undo_with_no_history_returns_null_data() {
    let app = build_test_app();
    let response = post_as(app.router, "/api/v1/boards/1/undo", ALICE).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"data": null}));
}

#[tokio::test]
async fn http_mutations_reach_board_subscribers() {
    let app = build_test_app();
    let mut rx = app.state.bus.subscribe(BoardTopic(BOARD));

    post_json_as(
        app.router.clone(),
        &actions(BOARD),
        ALICE,
        json!({"action_type": "ADD", "instance_id": "a", "object_type": "shape", "payload": {}}),
    )
    .await;
    post_as(app.router, "/api/v1/boards/1/undo", ALICE).await;

    let first = rx.recv().await.unwrap();
    assert_eq!(first.instance_id, "a");
    assert!(!first.is_tombstone());
    let second = rx.recv().await.unwrap();
    assert!(second.is_tombstone());
}

// ---------------------------------------------------------------------------
// Test: error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_member_gets_403() {
    let app = build_test_app();

    for response in [
        get_as(app.router.clone(), "/api/v1/boards/1/objects", MALLORY).await,
        get_as(app.router.clone(), "/api/v1/boards/1/actions", MALLORY).await,
        post_as(app.router.clone(), "/api/v1/boards/1/undo", MALLORY).await,
        post_json_as(
            app.router.clone(),
            &actions(BOARD),
            MALLORY,
            json!({"action_type": "DELETE", "instance_id": "a"}),
        )
        .await,
    ] {
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "ACCESS_DENIED");
    }
}

#[tokio::test]
async fn update_of_unknown_object_is_404() {
    let app = build_test_app();
    let response = post_json_as(
        app.router,
        &actions(BOARD),
        ALICE,
        json!({"action_type": "UPDATE", "instance_id": "nope", "payload": {"x": 1}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "OBJECT_NOT_FOUND");
}

#[tokio::test]
async fn duplicate_add_is_409() {
    let app = build_test_app();
    let body = json!({"action_type": "ADD", "instance_id": "a", "object_type": "shape", "payload": {}});
    let first = post_json_as(app.router.clone(), &actions(BOARD), ALICE, body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json_as(app.router, &actions(BOARD), BOB, body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "OBJECT_EXISTS");
}

#[tokio::test]
async fn missing_payload_is_invalid_payload() {
    let app = build_test_app();
    let response = post_json_as(
        app.router,
        &actions(BOARD),
        ALICE,
        json!({"action_type": "ADD", "instance_id": "a", "object_type": "shape", "payload": null}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn bad_object_type_is_validation_error() {
    let app = build_test_app();
    let response = post_json_as(
        app.router,
        &actions(BOARD),
        ALICE,
        json!({"action_type": "ADD", "instance_id": "a", "object_type": "Not Valid", "payload": {}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn held_board_returns_503_busy() {
    let mut config = test_config();
    config.board_lock_timeout_ms = 50;
    let app = build_test_app_with(config);
    let _held = app.state.sync.locks().acquire(BOARD).await.unwrap();

    let response = post_as(app.router, "/api/v1/boards/1/undo", ALICE).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(body_json(response).await["code"], "BUSY");
}

#[tokio::test]
async fn revoking_membership_takes_effect_immediately() {
    let app = build_test_app();
    assert_eq!(
        get_as(app.router.clone(), "/api/v1/boards/1/objects", BOB).await.status(),
        StatusCode::OK
    );

    app.members.revoke(BOARD, BOB);
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        get_as(app.router, "/api/v1/boards/1/objects", BOB),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
