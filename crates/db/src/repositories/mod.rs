//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! that stand alone accept `&PgPool`; methods that take part in a board
//! transaction accept `&mut PgConnection` so callers can pass `&mut *tx`.

pub mod action_record_repo;
pub mod board_member_repo;
pub mod board_object_repo;

pub use action_record_repo::ActionRecordRepo;
pub use board_member_repo::BoardMemberRepo;
pub use board_object_repo::BoardObjectRepo;
