//! Status read path.
//!
//! One joined query for the paintings, one batched query for every
//! reference image any of them used -- never a per-painting lookup. The
//! row-to-view shaping is a pure function so the wire shape is testable
//! without a database.

use std::collections::{BTreeMap, BTreeSet};

use atelier_core::generation::{IN_PROGRESS_SUMMARY, NO_INSTRUCTIONS, PLACEHOLDER_SUMMARY};
use atelier_core::types::DbId;
use atelier_db::models::generation::{PaintingView, PromptDetails, StatusResponse};
use atelier_db::models::painting::{Painting, PaintingStatusRow};
use atelier_db::models::title::Title;
use atelier_db::repositories::{PaintingRepo, ReferenceRepo};
use atelier_db::DbPool;

/// Read-side reconciliation of per-painting generation status.
pub struct StatusService;

impl StatusService {
    /// All paintings for a title, newest first, plus the image payload of
    /// every reference any of them consulted.
    pub async fn get_status(
        pool: &DbPool,
        title_id: DbId,
    ) -> Result<StatusResponse, sqlx::Error> {
        let rows = PaintingRepo::list_status_rows(pool, title_id).await?;

        // Distinct reference ids across the whole set, resolved in one
        // batched lookup.
        let all_ids: Vec<DbId> = rows
            .iter()
            .flat_map(|r| r.used_reference_ids.iter().flatten().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let payloads = ReferenceRepo::payloads_by_ids(pool, &all_ids).await?;
        let reference_data_map: BTreeMap<DbId, String> = payloads
            .into_iter()
            .map(|p| (p.id, p.image_data))
            .collect();

        let paintings = rows.into_iter().map(build_view).collect();

        Ok(StatusResponse {
            paintings,
            reference_data_map,
        })
    }
}

/// Shape one joined row into the wire view.
///
/// Idea fields fall back to in-progress placeholder text while concept
/// generation is still pending for the painting.
pub fn build_view(row: PaintingStatusRow) -> PaintingView {
    let summary = row
        .summary
        .unwrap_or_else(|| IN_PROGRESS_SUMMARY.to_string());
    let full_prompt = row.full_prompt.unwrap_or_default();
    let reference_images = row.used_reference_ids.unwrap_or_default();

    let prompt_details = PromptDetails {
        summary: summary.clone(),
        title: row.title,
        instructions: row
            .instructions
            .unwrap_or_else(|| NO_INSTRUCTIONS.to_string()),
        reference_count: reference_images.len(),
        reference_images: reference_images.clone(),
        full_prompt: full_prompt.clone(),
    };

    PaintingView {
        id: row.id,
        title_id: row.title_id,
        idea_id: row.idea_id,
        image_url: row.image_url.unwrap_or_default(),
        image_data: row.image_data.unwrap_or_default(),
        status: row.status,
        error_message: row.error_message.unwrap_or_default(),
        summary,
        full_prompt,
        created_at: row.created_at,
        prompt_details,
    }
}

/// Shape a freshly inserted placeholder into the wire view returned by
/// the generate endpoint. `reference_count` is how many references will
/// feed the batch; none have been consulted yet.
pub fn placeholder_view(painting: &Painting, title: &Title, reference_count: usize) -> PaintingView {
    PaintingView {
        id: painting.id,
        title_id: painting.title_id,
        idea_id: None,
        image_url: String::new(),
        image_data: String::new(),
        status: painting.status,
        error_message: String::new(),
        summary: PLACEHOLDER_SUMMARY.to_string(),
        full_prompt: String::new(),
        created_at: painting.created_at,
        prompt_details: PromptDetails {
            summary: PLACEHOLDER_SUMMARY.to_string(),
            title: title.title.clone(),
            instructions: title
                .instructions
                .clone()
                .unwrap_or_else(|| NO_INSTRUCTIONS.to_string()),
            reference_count,
            reference_images: Vec::new(),
            full_prompt: String::new(),
        },
    }
}
