//! Route definitions for the `/references` resource.
//!
//! `/global` is registered before `/{titleId}`; the static segment wins
//! route matching.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::references;
use crate::state::AppState;

/// Routes mounted at `/references`.
///
/// ```text
/// POST   /            -> upload_reference
/// GET    /global      -> list_global_references
/// GET    /{titleId}   -> list_title_references
/// DELETE /{id}        -> delete_reference
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(references::upload_reference))
        .route("/global", get(references::list_global_references))
        .route(
            "/{id}",
            get(references::list_title_references).delete(references::delete_reference),
        )
}
