//! Board membership checks.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use boardsync_core::error::CoreError;
use boardsync_core::types::DbId;
use boardsync_db::repositories::BoardMemberRepo;
use boardsync_db::DbPool;

use crate::error::SyncError;

/// Answers whether a user may read and mutate a board.
#[async_trait]
pub trait MembershipGuard: Send + Sync {
    async fn is_member(&self, board_id: DbId, user_id: DbId) -> Result<bool, SyncError>;
}

/// Fail with [`CoreError::AccessDenied`] unless `user_id` is a member.
pub async fn require_member(
    guard: &dyn MembershipGuard,
    board_id: DbId,
    user_id: DbId,
) -> Result<(), SyncError> {
    if guard.is_member(board_id, user_id).await? {
        Ok(())
    } else {
        tracing::debug!(board_id, user_id, "Membership check rejected");
        Err(CoreError::AccessDenied { board_id, user_id }.into())
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Membership backed by the `board_members` table.
pub struct PgMembershipGuard {
    pool: DbPool,
}

impl PgMembershipGuard {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipGuard for PgMembershipGuard {
    async fn is_member(&self, board_id: DbId, user_id: DbId) -> Result<bool, SyncError> {
        Ok(BoardMemberRepo::is_member(&self.pool, board_id, user_id).await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Membership held in process memory.
#[derive(Default)]
pub struct InMemoryMembership {
    members: RwLock<HashSet<(DbId, DbId)>>,
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, board_id: DbId, user_id: DbId) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((board_id, user_id));
    }

    pub fn revoke(&self, board_id: DbId, user_id: DbId) -> bool {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(board_id, user_id))
    }
}

#[async_trait]
impl MembershipGuard for InMemoryMembership {
    async fn is_member(&self, board_id: DbId, user_id: DbId) -> Result<bool, SyncError> {
        Ok(self
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(board_id, user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn grant_and_revoke() {
        let guard = InMemoryMembership::new();
        guard.grant(1, 10);
        assert!(require_member(&guard, 1, 10).await.is_ok());

        assert!(guard.revoke(1, 10));
        let err = require_member(&guard, 1, 10).await.unwrap_err();
        assert_matches!(
            err,
            SyncError::Core(CoreError::AccessDenied { board_id: 1, user_id: 10 })
        );
    }
}
