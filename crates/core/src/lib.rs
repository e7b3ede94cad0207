//! Domain types and pure logic for board synchronization.
//!
//! Nothing in this crate performs I/O. The database layer, the sync
//! services, and the transport all share these types so that the action
//! kinds, delta shapes, and undo/redo transitions are defined exactly once.

pub mod action;
pub mod board;
pub mod collaboration;
pub mod delta;
pub mod error;
pub mod types;
pub mod undo;
