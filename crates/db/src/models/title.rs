//! Title entity model and DTOs.

use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `titles` table. A title owns its ideas, paintings, and
/// title-scoped references; deleting it cascades to all three.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Title {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub instructions: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new title.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTitle {
    pub title: String,
    pub instructions: Option<String>,
}

/// DTO for renaming a title or editing its instructions.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTitle {
    pub title: Option<String>,
    pub instructions: Option<String>,
}
