//! Repository for the `paintings` table.
//!
//! Status transitions always go through one of the named methods below so
//! every write site is explicit about the state it produces. No method
//! here updates more than one painting row, which is what lets concurrent
//! render tasks and single-item retries run without row contention.

use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::painting::{Painting, PaintingDetail, PaintingStatusRow};
use crate::models::status::PaintingStatus;

/// Column list for `paintings` queries.
const COLUMNS: &str = "\
    id, title_id, idea_id, image_url, image_data, status, \
    error_message, used_reference_ids, created_at";

/// Provides CRUD and status-transition operations for paintings.
pub struct PaintingRepo;

impl PaintingRepo {
    /// Insert one placeholder painting in `creating_prompt` with no idea
    /// attached. Called `quantity` times, synchronously, before the
    /// generate endpoint responds.
    pub async fn create_placeholder(
        pool: &PgPool,
        title_id: DbId,
    ) -> Result<Painting, sqlx::Error> {
        let query = format!(
            "INSERT INTO paintings (title_id, status) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Painting>(&query)
            .bind(title_id)
            .bind(PaintingStatus::CreatingPrompt)
            .fetch_one(pool)
            .await
    }

    /// Find a painting by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Painting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM paintings WHERE id = $1");
        sqlx::query_as::<_, Painting>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a painting joined with its title's owner and text, for the
    /// retry path's ownership check and provider context.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PaintingDetail>, sqlx::Error> {
        sqlx::query_as::<_, PaintingDetail>(
            "SELECT p.id, p.title_id, p.idea_id, p.status, \
                    t.user_id, t.title, t.instructions \
             FROM paintings p \
             JOIN titles t ON p.title_id = t.id \
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All paintings of a title, newest first.
    pub async fn list_by_title(
        pool: &PgPool,
        title_id: DbId,
    ) -> Result<Vec<Painting>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM paintings \
             WHERE title_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Painting>(&query)
            .bind(title_id)
            .fetch_all(pool)
            .await
    }

    /// All paintings of a title joined with idea text and title text,
    /// newest first. This is the status service's single read.
    pub async fn list_status_rows(
        pool: &PgPool,
        title_id: DbId,
    ) -> Result<Vec<PaintingStatusRow>, sqlx::Error> {
        sqlx::query_as::<_, PaintingStatusRow>(
            "SELECT p.id, p.title_id, p.idea_id, p.image_url, p.image_data, \
                    p.status, p.error_message, p.used_reference_ids, p.created_at, \
                    i.summary, i.full_prompt, \
                    t.title, t.instructions \
             FROM paintings p \
             LEFT JOIN ideas i ON p.idea_id = i.id \
             JOIN titles t ON p.title_id = t.id \
             WHERE p.title_id = $1 \
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(title_id)
        .fetch_all(pool)
        .await
    }

    /// Set a bare status, clearing any stale error message.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: PaintingStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE paintings SET status = $2, error_message = NULL WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Attach a freshly generated idea and advance to `prompt_ready`.
    pub async fn attach_idea(
        pool: &PgPool,
        id: DbId,
        idea_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE paintings SET idea_id = $2, status = $3 WHERE id = $1")
            .bind(id)
            .bind(idea_id)
            .bind(PaintingStatus::PromptReady)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Terminal failure: persist the (already truncated) error message.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE paintings SET status = $2, error_message = $3 WHERE id = $1")
            .bind(id)
            .bind(PaintingStatus::Failed)
            .bind(error_message)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Terminal success: persist the rendered image and the reference ids
    /// that were supplied to the render call.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        image_url: &str,
        image_data: &str,
        used_reference_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let refs = if used_reference_ids.is_empty() {
            None
        } else {
            Some(used_reference_ids)
        };
        sqlx::query(
            "UPDATE paintings \
             SET status = $2, image_url = $3, image_data = $4, \
                 used_reference_ids = $5, error_message = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PaintingStatus::Completed)
        .bind(image_url)
        .bind(image_data)
        .bind(refs)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Reset for a full regenerate: wipe error/image fields and restart
    /// at `creating_prompt`. The old idea link is cleared; the retry will
    /// attach a fresh one.
    pub async fn reset_for_regenerate(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE paintings \
             SET status = $2, idea_id = NULL, error_message = NULL, \
                 image_url = NULL, image_data = NULL, used_reference_ids = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PaintingStatus::CreatingPrompt)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Reset for a render-only retry: keep the existing idea, wipe the
    /// failed output, and restart at `generating_image`.
    pub async fn reset_for_rerender(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE paintings \
             SET status = $2, error_message = NULL, \
                 image_url = NULL, image_data = NULL, used_reference_ids = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PaintingStatus::GeneratingImage)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Startup sweep: fail every painting stranded in a non-terminal
    /// status by a previous process crash. Returns how many were swept.
    pub async fn sweep_stale(pool: &PgPool, message: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE paintings SET status = $1, error_message = $2 \
             WHERE status NOT IN ($3, $4)",
        )
        .bind(PaintingStatus::Failed)
        .bind(message)
        .bind(PaintingStatus::Completed)
        .bind(PaintingStatus::Failed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
