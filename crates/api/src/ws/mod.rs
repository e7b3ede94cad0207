//! WebSocket infrastructure for board collaboration.
//!
//! Connection management, heartbeat, the authenticated upgrade handler,
//! and per-connection board subscriptions.

mod handler;
mod heartbeat;
pub mod manager;
pub mod subscription;

pub use handler::ws_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::WsManager;
