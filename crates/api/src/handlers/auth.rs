//! Handlers for the session-issuance boundary.
//!
//! Routes:
//! - `POST /auth/register` -- create an account, returns a token
//! - `POST /auth/login`    -- exchange credentials for a token
//! - `GET  /auth/me`       -- current user (requires auth)

use atelier_core::error::CoreError;
use atelier_db::models::user::{LoginUser, RegisterUser, User};
use atelier_db::repositories::UserRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response for register/login: the token plus the user it belongs to.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

/// Response for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> AppResult<impl IntoResponse> {
    if input.username.trim().is_empty() || input.email.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username and email are required".to_string(),
        )));
    }
    if input.password.len() < 8 {
        return Err(AppError::Core(CoreError::Validation(
            "Password must be at least 8 characters".to_string(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        input.username.trim(),
        input.email.trim(),
        &password_hash,
    )
    .await?;

    let token = generate_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { token, user })))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginUser>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim()).await?;

    // Verify even when the user is unknown so the timing does not leak
    // which emails exist.
    let valid = match &user {
        Some(user) => verify_password(&input.password, &user.password_hash),
        None => {
            let _ = verify_password(&input.password, "");
            false
        }
    };

    let Some(user) = user.filter(|_| valid) else {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".to_string(),
        )));
    };

    let token = generate_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(TokenResponse { token, user }))
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(MeResponse { user }))
}
