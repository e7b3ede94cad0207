//! Repository for the `board_members` table.

use boardsync_core::types::DbId;
use sqlx::PgPool;

use crate::models::board_member::BoardMember;

/// Column list for `board_members` queries.
const COLUMNS: &str = "board_id, user_id, created_at";

/// Membership lookups. Membership itself is administered outside the sync
/// core; `add` and `remove` exist for provisioning and tests.
pub struct BoardMemberRepo;

impl BoardMemberRepo {
    /// Returns `true` if the user belongs to the board.
    pub async fn is_member(
        pool: &PgPool,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM board_members WHERE board_id = $1 AND user_id = $2)",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Add a member. Adding an existing member returns the existing row.
    pub async fn add(
        pool: &PgPool,
        board_id: DbId,
        user_id: DbId,
    ) -> Result<BoardMember, sqlx::Error> {
        let sql = format!(
            "INSERT INTO board_members (board_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (board_id, user_id) DO UPDATE SET board_id = EXCLUDED.board_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BoardMember>(&sql)
            .bind(board_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Remove a member. Returns `true` if a row was deleted.
    pub async fn remove(pool: &PgPool, board_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
