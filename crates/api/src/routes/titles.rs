//! Route definitions for the `/titles` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::titles;
use crate::state::AppState;

/// Routes mounted at `/titles`.
///
/// ```text
/// GET    /        -> list_titles
/// POST   /        -> create_title
/// GET    /{id}    -> get_title
/// PUT    /{id}    -> update_title
/// DELETE /{id}    -> delete_title
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(titles::list_titles).post(titles::create_title))
        .route(
            "/{id}",
            get(titles::get_title)
                .put(titles::update_title)
                .delete(titles::delete_title),
        )
}
