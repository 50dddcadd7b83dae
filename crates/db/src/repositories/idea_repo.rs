//! Repository for the `ideas` table.
//!
//! Ideas are append-only: there is deliberately no update method here. A
//! regenerated painting gets a brand-new idea row.

use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::idea::{CreateIdea, Idea};

/// Column list for `ideas` queries.
const COLUMNS: &str = "id, title_id, summary, full_prompt, created_at";

/// Provides insert/lookup operations for painting ideas.
pub struct IdeaRepo;

impl IdeaRepo {
    /// Persist a freshly generated idea.
    pub async fn create(pool: &PgPool, input: &CreateIdea) -> Result<Idea, sqlx::Error> {
        let query = format!(
            "INSERT INTO ideas (title_id, summary, full_prompt) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Idea>(&query)
            .bind(input.title_id)
            .bind(&input.summary)
            .bind(&input.full_prompt)
            .fetch_one(pool)
            .await
    }

    /// Find an idea by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Idea>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ideas WHERE id = $1");
        sqlx::query_as::<_, Idea>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Summaries of every idea a title already has, newest first. Fed to
    /// the concept provider so new ideas steer away from old ones.
    pub async fn list_summaries_by_title(
        pool: &PgPool,
        title_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT summary FROM ideas WHERE title_id = $1 ORDER BY created_at DESC",
        )
        .bind(title_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
