//! Idea entity model and DTOs.
//!
//! Ideas are immutable once created. A retry inserts a fresh row; nothing
//! in the codebase updates an existing one.

use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `ideas` table: one generated painting concept.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Idea {
    pub id: DbId,
    pub title_id: DbId,
    /// Short human-readable concept (~30-50 words).
    pub summary: String,
    /// Detailed render prompt (~100-200 words).
    pub full_prompt: String,
    pub created_at: Timestamp,
}

/// DTO for persisting a freshly generated idea.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIdea {
    pub title_id: DbId,
    pub summary: String,
    pub full_prompt: String,
}
