//! Handlers for the generation pipeline endpoints.
//!
//! Routes:
//! - `POST /paintings/generate`          -- start a batch, returns placeholders
//! - `GET  /paintings/{titleId}`         -- poll per-painting status
//! - `POST /paintings/{id}/regenerate`   -- full retry (fresh idea)
//! - `POST /paintings/{id}/rerender`     -- render-only retry (same idea)
//!
//! Ownership is checked here; the orchestrator trusts its caller.

use atelier_core::error::CoreError;
use atelier_core::types::DbId;
use atelier_db::models::generation::{
    GenerateRequest, GenerateResponse, RetryResponse, StatusResponse,
};
use atelier_db::models::painting::PaintingDetail;
use atelier_db::repositories::{PaintingRepo, TitleRepo};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use atelier_pipeline::status::placeholder_view;
use atelier_pipeline::{RetryMode, StatusService};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Default batch size when the request omits `quantity`.
const DEFAULT_QUANTITY: u32 = 5;

/// POST /api/v1/paintings/generate
///
/// Creates placeholders synchronously and returns them; concept and
/// render phases continue in the background. Responds in well under a
/// second regardless of provider latency.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let title = TitleRepo::find_owned(&state.pool, input.title_id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id: input.title_id,
        }))?;

    let quantity = input.quantity.unwrap_or(DEFAULT_QUANTITY);
    let batch = state.orchestrator.start(&title, quantity).await?;

    let paintings = batch
        .paintings
        .iter()
        .map(|p| placeholder_view(p, &title, batch.reference_count))
        .collect::<Vec<_>>();

    Ok(Json(GenerateResponse {
        message: format!("Started generating {quantity} paintings"),
        paintings,
    }))
}

/// GET /api/v1/paintings/{titleId}
///
/// Full current status for every painting of the title, newest first,
/// plus a batched id -> image payload map for all referenced reference
/// images.
pub async fn get_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<Json<StatusResponse>> {
    TitleRepo::find_owned(&state.pool, title_id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id: title_id,
        }))?;

    let status = StatusService::get_status(&state.pool, title_id).await?;
    Ok(Json(status))
}

/// Load a painting and verify the caller owns its title.
async fn find_and_authorize(
    state: &AppState,
    painting_id: DbId,
    auth: &AuthUser,
) -> AppResult<PaintingDetail> {
    let detail = PaintingRepo::find_detail(&state.pool, painting_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Painting",
            id: painting_id,
        }))?;

    if detail.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot retry another user's painting".to_string(),
        )));
    }
    Ok(detail)
}

/// POST /api/v1/paintings/{id}/regenerate
///
/// Full pipeline restart for one painting: a fresh idea, then a render.
/// Sibling paintings are untouched.
pub async fn regenerate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(painting_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = find_and_authorize(&state, painting_id, &auth).await?;
    state
        .orchestrator
        .retry_single(&detail, RetryMode::Full)
        .await?;

    Ok(Json(RetryResponse {
        message: "Regeneration started".to_string(),
    }))
}

/// POST /api/v1/paintings/{id}/rerender
///
/// Render-only restart: reuses the painting's existing idea. Rejected if
/// the painting never got one.
pub async fn rerender(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(painting_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = find_and_authorize(&state, painting_id, &auth).await?;
    state
        .orchestrator
        .retry_single(&detail, RetryMode::RenderOnly)
        .await?;

    Ok(Json(RetryResponse {
        message: "Re-render started".to_string(),
    }))
}
