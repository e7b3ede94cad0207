//! Repository for the `board_actions` table (the per-board action log).

use boardsync_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::action_record::{ActionRecord, NewActionRecord};

/// Column list for `board_actions` queries.
const COLUMNS: &str = "id, board_id, user_id, object_id, action_type, \
                       state_before, state_after, undone, created_at";

/// SQLSTATE raised when `lock_timeout` expires.
pub const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Append-only log access. The only in-place change is the `undone` flag.
pub struct ActionRecordRepo;

impl ActionRecordRepo {
    /// Take the board's transaction-scoped advisory lock.
    ///
    /// Serializes all log writers for `board_id` across server processes
    /// until the surrounding transaction ends. `lock_timeout_ms` bounds this
    /// wait and every row lock taken later in the transaction; exceeding it
    /// fails with SQLSTATE [`LOCK_NOT_AVAILABLE`].
    pub async fn lock_board(
        conn: &mut PgConnection,
        board_id: DbId,
        lock_timeout_ms: u64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{lock_timeout_ms}ms"))
            .execute(&mut *conn)
            .await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(board_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Append a log entry.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewActionRecord<'_>,
    ) -> Result<ActionRecord, sqlx::Error> {
        let sql = format!(
            "INSERT INTO board_actions \
                (board_id, user_id, object_id, action_type, state_before, state_after) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActionRecord>(&sql)
            .bind(input.board_id)
            .bind(input.user_id)
            .bind(input.object_id)
            .bind(input.action.action_type().as_str())
            .bind(input.action.state_before())
            .bind(input.action.state_after())
            .fetch_one(&mut *conn)
            .await
    }

    /// Select and row-lock the newest entry of a board with the given
    /// `undone` value. Newest means latest `created_at`, ties broken by id.
    pub async fn latest_for_update(
        conn: &mut PgConnection,
        board_id: DbId,
        undone: bool,
    ) -> Result<Option<ActionRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM board_actions \
             WHERE board_id = $1 AND undone = $2 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, ActionRecord>(&sql)
            .bind(board_id)
            .bind(undone)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Set the `undone` flag of one entry.
    pub async fn set_undone(
        conn: &mut PgConnection,
        id: DbId,
        undone: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE board_actions SET undone = $2 WHERE id = $1")
            .bind(id)
            .bind(undone)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// List a board's log, newest first.
    pub async fn list_for_board(
        pool: &PgPool,
        board_id: DbId,
        limit: i64,
    ) -> Result<Vec<ActionRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM board_actions \
             WHERE board_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ActionRecord>(&sql)
            .bind(board_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
