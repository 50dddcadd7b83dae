//! Repository for the `reference_images` table.
//!
//! Uploading a scoped reference does NOT delete prior references for the
//! same title; a title may carry any number of references and all of them
//! (plus the user's globals) feed the next generation batch.

use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::reference::{CreateReference, ReferenceImage, ReferencePayload};

/// Column list for `reference_images` queries.
const COLUMNS: &str = "id, user_id, title_id, image_data, is_global, created_at";

/// Provides CRUD operations for reference images.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// Insert a new reference image.
    ///
    /// A global reference is stored with `title_id = NULL` regardless of
    /// what the caller passed, keeping the global/scoped invariant intact
    /// at the row level.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateReference,
    ) -> Result<ReferenceImage, sqlx::Error> {
        let is_global = input.is_global.unwrap_or(false);
        let title_id = if is_global { None } else { input.title_id };

        let query = format!(
            "INSERT INTO reference_images (user_id, title_id, image_data, is_global) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReferenceImage>(&query)
            .bind(user_id)
            .bind(title_id)
            .bind(&input.image_data)
            .bind(is_global)
            .fetch_one(pool)
            .await
    }

    /// All references that apply to a generation for `title_id`: the
    /// title's scoped references plus the user's globals.
    pub async fn list_for_generation(
        pool: &PgPool,
        title_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<ReferencePayload>, sqlx::Error> {
        sqlx::query_as::<_, ReferencePayload>(
            "SELECT id, image_data FROM reference_images \
             WHERE title_id = $1 OR (user_id = $2 AND is_global) \
             ORDER BY created_at",
        )
        .bind(title_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// List the scoped references of one title.
    pub async fn list_by_title(
        pool: &PgPool,
        title_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<ReferenceImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reference_images \
             WHERE title_id = $1 AND user_id = $2 AND NOT is_global \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, ReferenceImage>(&query)
            .bind(title_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List a user's global references.
    pub async fn list_global(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ReferenceImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reference_images \
             WHERE user_id = $1 AND is_global \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, ReferenceImage>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Batched payload lookup for the status read path: one query for all
    /// reference ids used by any painting in a title.
    pub async fn payloads_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<ReferencePayload>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, ReferencePayload>(
            "SELECT id, image_data FROM reference_images WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Delete one reference. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM reference_images WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
