pub mod boards;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws?token=<jwt>                      WebSocket
///
/// /boards/{board_id}/actions           submit (POST), history (GET)
/// /boards/{board_id}/objects           active objects (GET)
/// /boards/{board_id}/undo              undo (POST)
/// /boards/{board_id}/redo              redo (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/boards", boards::router())
}
