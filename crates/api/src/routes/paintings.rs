//! Route definitions for the generation pipeline endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::paintings;
use crate::state::AppState;

/// Routes mounted at `/paintings`.
///
/// ```text
/// POST /generate          -> generate
/// GET  /{titleId}         -> get_status
/// POST /{id}/regenerate   -> regenerate
/// POST /{id}/rerender     -> rerender
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(paintings::generate))
        .route("/{title_id}", get(paintings::get_status))
        .route("/{id}/regenerate", post(paintings::regenerate))
        .route("/{id}/rerender", post(paintings::rerender))
}
