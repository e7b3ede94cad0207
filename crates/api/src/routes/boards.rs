//! Route definitions for board mutation, history and state.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::boards;
use crate::state::AppState;

/// Board routes mounted at `/boards`.
///
/// ```text
/// POST   /{board_id}/actions  -> submit_action
/// GET    /{board_id}/actions  -> list_actions
/// GET    /{board_id}/objects  -> list_objects
/// POST   /{board_id}/undo     -> undo
/// POST   /{board_id}/redo     -> redo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{board_id}/actions",
            get(boards::list_actions).post(boards::submit_action),
        )
        .route("/{board_id}/objects", get(boards::list_objects))
        .route("/{board_id}/undo", post(boards::undo))
        .route("/{board_id}/redo", post(boards::redo))
}
