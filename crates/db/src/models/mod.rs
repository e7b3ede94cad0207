//! Domain model structs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus conversions into the `core` planning types.

pub mod action_record;
pub mod board_member;
pub mod board_object;
