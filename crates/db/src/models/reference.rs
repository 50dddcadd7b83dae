//! Reference image entity model and DTOs.
//!
//! A reference is either global (`title_id IS NULL`, applies to every
//! title the user owns) or scoped to exactly one title -- never both.

use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reference_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferenceImage {
    pub id: DbId,
    pub user_id: DbId,
    pub title_id: Option<DbId>,
    pub image_data: String,
    pub is_global: bool,
    pub created_at: Timestamp,
}

/// DTO for uploading a reference image.
///
/// `title_id` must be set for a scoped reference and absent for a global
/// one; `is_global` defaults to false.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReference {
    pub title_id: Option<DbId>,
    pub image_data: String,
    pub is_global: Option<bool>,
}

/// The slice of a reference the providers need: id for bookkeeping plus
/// the image payload to attach to the external call.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferencePayload {
    pub id: DbId,
    pub image_data: String,
}
