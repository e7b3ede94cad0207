//! Board synchronization services.
//!
//! - [`MutationService`]: applies ADD/UPDATE/DELETE and logs them.
//! - [`UndoRedoCoordinator`]: walks the linear undo/redo pointer.
//! - [`BoardSync`]: the facade the transport calls; owns both services,
//!   the per-board [`BoardLocks`], and the read paths.
//!
//! Persistence sits behind [`BoardStore`] ([`PgBoardStore`] in production,
//! [`MemoryBoardStore`] for tests and local runs) and membership behind
//! [`MembershipGuard`].

pub mod error;
pub mod guard;
pub mod locks;
pub mod memory;
pub mod mutation;
pub mod pg_store;
pub mod service;
pub mod store;
pub mod undo_redo;

pub use error::SyncError;
pub use guard::{InMemoryMembership, MembershipGuard, PgMembershipGuard};
pub use locks::BoardLocks;
pub use memory::MemoryBoardStore;
pub use mutation::MutationService;
pub use pg_store::PgBoardStore;
pub use service::BoardSync;
pub use store::{AppliedMutation, BoardStore, HistoryStep};
pub use undo_redo::UndoRedoCoordinator;
