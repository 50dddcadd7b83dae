pub mod auth;
pub mod health;
pub mod paintings;
pub mod references;
pub mod titles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                  register (public)
/// /auth/login                     login (public)
/// /auth/me                        current user
///
/// /titles                         list, create
/// /titles/{id}                    get, update, delete
///
/// /references                     upload
/// /references/global              list global
/// /references/{titleId}           list scoped
/// /references/{id}                delete
///
/// /paintings/generate             start a generation batch
/// /paintings/{titleId}            poll status
/// /paintings/{id}/regenerate      full retry
/// /paintings/{id}/rerender        render-only retry
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/titles", titles::router())
        .nest("/references", references::router())
        .nest("/paintings", paintings::router())
}
