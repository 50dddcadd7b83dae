//! Repository for the `titles` table.
//!
//! Every mutating method is scoped by `user_id` so ownership is enforced
//! at the query level, not just in the handler.

use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::title::{CreateTitle, Title, UpdateTitle};

/// Column list for `titles` queries.
const COLUMNS: &str = "id, user_id, title, instructions, created_at";

/// Provides CRUD operations for titles.
pub struct TitleRepo;

impl TitleRepo {
    /// Insert a new title owned by `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTitle,
    ) -> Result<Title, sqlx::Error> {
        let query = format!(
            "INSERT INTO titles (user_id, title, instructions) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Title>(&query)
            .bind(user_id)
            .bind(input.title.trim())
            .bind(&input.instructions)
            .fetch_one(pool)
            .await
    }

    /// Find a title by id regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Title>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM titles WHERE id = $1");
        sqlx::query_as::<_, Title>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a title by id only if `user_id` owns it.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Title>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM titles WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Title>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's titles, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Title>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM titles WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Title>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update title text and/or instructions. Unset fields keep their
    /// current value. Returns the updated row, or `None` if the title
    /// does not exist or is not owned by `user_id`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateTitle,
    ) -> Result<Option<Title>, sqlx::Error> {
        let query = format!(
            "UPDATE titles \
             SET title = COALESCE($3, title), \
                 instructions = COALESCE($4, instructions) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Title>(&query)
            .bind(id)
            .bind(user_id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.instructions)
            .fetch_optional(pool)
            .await
    }

    /// Delete a title (cascades to ideas, paintings, and scoped
    /// references). Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
