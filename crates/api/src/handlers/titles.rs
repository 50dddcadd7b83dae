//! Handlers for the `/titles` resource.
//!
//! Routes:
//! - `GET    /titles`       -- list the caller's titles
//! - `POST   /titles`       -- create
//! - `GET    /titles/{id}`  -- get one
//! - `PUT    /titles/{id}`  -- rename / edit instructions
//! - `DELETE /titles/{id}`  -- delete (cascades to ideas, paintings,
//!   scoped references)

use atelier_core::error::CoreError;
use atelier_core::types::DbId;
use atelier_db::models::title::{CreateTitle, Title, UpdateTitle};
use atelier_db::repositories::TitleRepo;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response for `GET /titles`.
#[derive(Debug, Serialize)]
pub struct TitlesResponse {
    pub titles: Vec<Title>,
}

/// POST /api/v1/titles
pub async fn create_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTitle>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Title is required".to_string(),
        )));
    }

    let title = TitleRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(title_id = title.id, user_id = auth.user_id, "Title created");
    Ok((StatusCode::CREATED, Json(title)))
}

/// GET /api/v1/titles
pub async fn list_titles(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let titles = TitleRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(TitlesResponse { titles }))
}

/// GET /api/v1/titles/{id}
pub async fn get_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let title = TitleRepo::find_owned(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id,
        }))?;
    Ok(Json(title))
}

/// PUT /api/v1/titles/{id}
pub async fn update_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTitle>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref text) = input.title {
        if text.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Title must not be empty".to_string(),
            )));
        }
    }

    let title = TitleRepo::update(&state.pool, id, auth.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id,
        }))?;
    Ok(Json(title))
}

/// DELETE /api/v1/titles/{id}
pub async fn delete_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = TitleRepo::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Title",
            id,
        }));
    }
    tracing::info!(title_id = id, user_id = auth.user_id, "Title deleted");
    Ok(StatusCode::NO_CONTENT)
}
