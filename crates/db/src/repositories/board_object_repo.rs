//! Repository for the `board_objects` table.

use boardsync_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::board_object::BoardObject;

/// Column list for `board_objects` queries.
const COLUMNS: &str = "id, board_id, instance_id, object_type, payload, is_active, \
                       created_by, last_edited_by, created_at, updated_at";

/// Reads and writes of live board objects.
pub struct BoardObjectRepo;

impl BoardObjectRepo {
    /// List the active objects of a board in creation order.
    pub async fn list_active(
        pool: &PgPool,
        board_id: DbId,
    ) -> Result<Vec<BoardObject>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM board_objects \
             WHERE board_id = $1 AND is_active = true ORDER BY id"
        );
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(board_id)
            .fetch_all(pool)
            .await
    }

    /// Find an object by instance id, active or not.
    pub async fn find_by_instance(
        pool: &PgPool,
        board_id: DbId,
        instance_id: &str,
    ) -> Result<Option<BoardObject>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM board_objects WHERE board_id = $1 AND instance_id = $2"
        );
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(board_id)
            .bind(instance_id)
            .fetch_optional(pool)
            .await
    }

    /// Find and row-lock an object by instance id inside a transaction.
    pub async fn find_by_instance_for_update(
        conn: &mut PgConnection,
        board_id: DbId,
        instance_id: &str,
    ) -> Result<Option<BoardObject>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM board_objects \
             WHERE board_id = $1 AND instance_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(board_id)
            .bind(instance_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find and row-lock an object by id inside a transaction.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<BoardObject>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM board_objects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a new active object.
    pub async fn insert(
        conn: &mut PgConnection,
        board_id: DbId,
        instance_id: &str,
        object_type: &str,
        payload: &serde_json::Value,
        user_id: DbId,
    ) -> Result<BoardObject, sqlx::Error> {
        let sql = format!(
            "INSERT INTO board_objects \
                (board_id, instance_id, object_type, payload, created_by, last_edited_by) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(board_id)
            .bind(instance_id)
            .bind(object_type)
            .bind(payload)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Overwrite the active flag and payload of an object.
    pub async fn write_state(
        conn: &mut PgConnection,
        id: DbId,
        is_active: bool,
        payload: &serde_json::Value,
        user_id: DbId,
    ) -> Result<BoardObject, sqlx::Error> {
        let sql = format!(
            "UPDATE board_objects \
             SET is_active = $2, payload = $3, last_edited_by = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BoardObject>(&sql)
            .bind(id)
            .bind(is_active)
            .bind(payload)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }
}
