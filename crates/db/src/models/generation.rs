//! Generation-flow DTOs: the wire shapes of the generate/status/retry
//! endpoints, kept separate from the entity-level models so the row
//! structs stay aligned with their tables.

use std::collections::BTreeMap;

use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::models::status::PaintingStatus;

/// Body for `POST /paintings/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub title_id: DbId,
    /// Number of paintings to generate. Defaults to 5; must be 1-10.
    pub quantity: Option<u32>,
}

/// Response for `POST /paintings/generate`: placeholders only, returned
/// before any external call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub paintings: Vec<PaintingView>,
}

/// Response for `GET /paintings/{titleId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub paintings: Vec<PaintingView>,
    /// Image payload for every reference id referenced by any painting in
    /// `paintings`, batched into one lookup. Keys serialize as strings.
    #[serde(rename = "referenceDataMap")]
    pub reference_data_map: BTreeMap<DbId, String>,
}

/// Response for the retry endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryResponse {
    pub message: String,
}

/// One painting as the client sees it, enriched with idea text and
/// prompt provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintingView {
    pub id: DbId,
    pub title_id: DbId,
    pub idea_id: Option<DbId>,
    pub image_url: String,
    pub image_data: String,
    pub status: PaintingStatus,
    pub error_message: String,
    pub summary: String,
    #[serde(rename = "fullPrompt")]
    pub full_prompt: String,
    pub created_at: Timestamp,
    #[serde(rename = "promptDetails")]
    pub prompt_details: PromptDetails,
}

/// Provenance block attached to every painting view: what went into the
/// prompt that produced (or will produce) this image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDetails {
    pub summary: String,
    pub title: String,
    pub instructions: String,
    #[serde(rename = "referenceCount")]
    pub reference_count: usize,
    #[serde(rename = "referenceImages")]
    pub reference_images: Vec<DbId>,
    #[serde(rename = "fullPrompt")]
    pub full_prompt: String,
}
