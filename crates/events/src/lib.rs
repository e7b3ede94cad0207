//! Board delta fan-out.
//!
//! - [`BroadcastGateway`]: the publish seam consumed by the sync services.
//! - [`BoardBus`]: in-process publish/subscribe hub with one
//!   `tokio::sync::broadcast` channel per board topic.

pub mod bus;

pub use bus::{BoardBus, BoardTopic, BroadcastGateway};
