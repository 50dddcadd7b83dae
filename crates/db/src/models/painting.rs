//! Painting entity model -- the central unit of progress tracking.

use atelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::PaintingStatus;

/// A row from the `paintings` table.
///
/// `idea_id` stays NULL until the concept phase attaches one.
/// `used_reference_ids` records which reference images were actually
/// supplied to the render call that produced `image_data`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Painting {
    pub id: DbId,
    pub title_id: DbId,
    pub idea_id: Option<DbId>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub status: PaintingStatus,
    pub error_message: Option<String>,
    pub used_reference_ids: Option<Vec<DbId>>,
    pub created_at: Timestamp,
}

/// A painting joined with its title's owner and text, used by the retry
/// path to authorize the caller and rebuild provider context.
#[derive(Debug, Clone, FromRow)]
pub struct PaintingDetail {
    pub id: DbId,
    pub title_id: DbId,
    pub idea_id: Option<DbId>,
    pub status: PaintingStatus,
    pub user_id: DbId,
    pub title: String,
    pub instructions: Option<String>,
}

/// A painting joined with its idea and title text, as read by the status
/// service. Idea fields are NULL while concept generation is pending.
#[derive(Debug, Clone, FromRow)]
pub struct PaintingStatusRow {
    pub id: DbId,
    pub title_id: DbId,
    pub idea_id: Option<DbId>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub status: PaintingStatus,
    pub error_message: Option<String>,
    pub used_reference_ids: Option<Vec<DbId>>,
    pub created_at: Timestamp,
    pub summary: Option<String>,
    pub full_prompt: Option<String>,
    pub title: String,
    pub instructions: Option<String>,
}
