use std::sync::Arc;

use boardsync_db::DbPool;
use boardsync_events::BoardBus;
use boardsync_sync::BoardSync;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, used by the health check.
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Mutations, undo/redo and reads for all boards.
    pub sync: Arc<BoardSync>,
    /// Delta fan-out; WebSocket subscriptions read from here.
    pub bus: Arc<BoardBus>,
}
