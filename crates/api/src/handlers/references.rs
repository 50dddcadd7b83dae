//! Handlers for the `/references` resource.
//!
//! Routes:
//! - `POST   /references`            -- upload (global or title-scoped)
//! - `GET    /references/global`     -- list the caller's global references
//! - `GET    /references/{titleId}`  -- list a title's scoped references
//! - `DELETE /references/{id}`       -- delete one
//!
//! Uploading never deletes earlier references: a title accumulates
//! references until the user removes them explicitly.

use atelier_core::error::CoreError;
use atelier_core::types::DbId;
use atelier_db::models::reference::{CreateReference, ReferenceImage};
use atelier_db::repositories::{ReferenceRepo, TitleRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response for the list endpoints.
#[derive(Debug, Serialize)]
pub struct ReferencesResponse {
    pub references: Vec<ReferenceImage>,
}

/// POST /api/v1/references
pub async fn upload_reference(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReference>,
) -> AppResult<impl IntoResponse> {
    if input.image_data.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Image data is required".to_string(),
        )));
    }

    let is_global = input.is_global.unwrap_or(false);
    match (is_global, input.title_id) {
        (false, None) => {
            return Err(AppError::Core(CoreError::Validation(
                "A non-global reference requires a title id".to_string(),
            )));
        }
        (false, Some(title_id)) => {
            // Scoped upload: the target title must exist and be the
            // caller's.
            TitleRepo::find_owned(&state.pool, title_id, auth.user_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Title",
                    id: title_id,
                }))?;
        }
        (true, _) => {}
    }

    let reference = ReferenceRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(
        reference_id = reference.id,
        title_id = reference.title_id,
        is_global = reference.is_global,
        "Reference uploaded",
    );
    Ok((StatusCode::CREATED, Json(reference)))
}

/// GET /api/v1/references/global
pub async fn list_global_references(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let references = ReferenceRepo::list_global(&state.pool, auth.user_id).await?;
    Ok(Json(ReferencesResponse { references }))
}

/// GET /api/v1/references/{titleId}
pub async fn list_title_references(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    TitleRepo::find_owned(&state.pool, title_id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id: title_id,
        }))?;

    let references = ReferenceRepo::list_by_title(&state.pool, title_id, auth.user_id).await?;
    Ok(Json(ReferencesResponse { references }))
}

/// DELETE /api/v1/references/{id}
pub async fn delete_reference(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = ReferenceRepo::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ReferenceImage",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}
