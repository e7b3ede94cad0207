//! Handlers for board mutations, undo/redo, and the read paths clients use
//! to resynchronize.
//!
//! Mutation and undo/redo deltas are also broadcast to the board's
//! WebSocket subscribers before the response is written.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use boardsync_core::action::{ActionType, MutationRequest};
use boardsync_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /boards/{board_id}/actions`.
#[derive(Debug, Deserialize)]
pub struct SubmitActionBody {
    pub action_type: ActionType,
    pub instance_id: String,
    /// Required for ADD.
    #[serde(default)]
    pub object_type: Option<String>,
    /// Required for ADD and UPDATE; ignored for DELETE.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// `?limit=` for the history listing. Clamped to 1..=500, default 100.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// POST /api/v1/boards/{board_id}/actions
///
/// Apply an ADD, UPDATE or DELETE. Returns 201 with the delta.
pub async fn submit_action(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
    body: Result<Json<SubmitActionBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let delta = state
        .sync
        .submit_action(MutationRequest {
            board_id,
            user_id: auth.user_id,
            action_type: body.action_type,
            instance_id: body.instance_id,
            object_type: body.object_type,
            payload: body.payload,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: delta })))
}

/// GET /api/v1/boards/{board_id}/actions?limit=
///
/// The board's action log, newest first.
pub async fn list_actions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let log = state
        .sync
        .history(board_id, auth.user_id, params.limit)
        .await?;
    Ok(Json(DataResponse { data: log }))
}

/// GET /api/v1/boards/{board_id}/objects
///
/// Active objects only; soft-deleted rows are never returned.
pub async fn list_objects(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let objects = state.sync.board_state(board_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: objects }))
}

/// POST /api/v1/boards/{board_id}/undo
///
/// Returns the emitted delta, or `{"data": null}` when there was nothing
/// to undo or the step had no visible effect.
pub async fn undo(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let delta = state.sync.undo(board_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: delta }))
}

/// POST /api/v1/boards/{board_id}/redo
pub async fn redo(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let delta = state.sync.redo(board_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: delta }))
}
