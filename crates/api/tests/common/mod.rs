//! Shared fixtures for API integration tests.
//!
//! Builds the full application router with the same middleware stack as
//! `main.rs`, but with deterministic stub providers so no external call
//! is ever made.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_api::auth::jwt::JwtConfig;
use atelier_api::config::ServerConfig;
use atelier_api::routes;
use atelier_api::state::AppState;
use atelier_core::types::DbId;
use atelier_db::models::idea::{CreateIdea, Idea};
use atelier_db::models::reference::ReferencePayload;
use atelier_db::repositories::{IdeaRepo, PaintingRepo};
use atelier_pipeline::{GenerationOrchestrator, GenerationRegistry, RetryPolicy};
use atelier_providers::{
    ConceptContext, ConceptGenerator, ImageRenderer, ProviderError, RenderResult,
};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

// ---------------------------------------------------------------------------
// Stub providers
// ---------------------------------------------------------------------------

/// Concept stub: always succeeds with a deterministic idea.
pub struct AlwaysConcept {
    pool: PgPool,
}

#[async_trait]
impl ConceptGenerator for AlwaysConcept {
    async fn generate(&self, ctx: &ConceptContext) -> Result<Idea, ProviderError> {
        let n = ctx.prior_summaries.len();
        let idea = IdeaRepo::create(
            &self.pool,
            &CreateIdea {
                title_id: ctx.title_id,
                summary: format!("concept {n} for {}", ctx.title_text),
                full_prompt: format!("detailed prompt {n} for {}", ctx.title_text),
            },
        )
        .await?;
        Ok(idea)
    }
}

/// Render stub: always succeeds and persists completion.
pub struct AlwaysRender {
    pool: PgPool,
}

#[async_trait]
impl ImageRenderer for AlwaysRender {
    async fn render(
        &self,
        painting_id: DbId,
        _idea_id: DbId,
        _full_prompt: &str,
        references: &[ReferencePayload],
    ) -> Result<RenderResult, ProviderError> {
        let image_url = format!("generated/test_{painting_id}.png");
        let image_data = "data:image/png;base64,dGVzdA==".to_string();
        let used: Vec<DbId> = references.iter().map(|r| r.id).collect();
        PaintingRepo::complete(&self.pool, painting_id, &image_url, &image_data, &used).await?;
        Ok(RenderResult {
            painting_id,
            image_url,
            image_data,
            used_reference_ids: used,
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build the full application router with stub providers, mirroring the
/// construction in `main.rs` so tests exercise the production middleware
/// stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let registry = GenerationRegistry::new();

    let concepts = Arc::new(AlwaysConcept { pool: pool.clone() });
    let renderer = Arc::new(AlwaysRender { pool: pool.clone() });
    let orchestrator =
        GenerationOrchestrator::new(pool.clone(), concepts, renderer, registry.clone())
            .with_retry(RetryPolicy {
                attempts: 2,
                base_delay: Duration::ZERO,
            })
            .with_inter_chunk_delay(Duration::ZERO);

    let state = AppState {
        pool,
        config: Arc::new(config),
        orchestrator,
        registry,
    };

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Issue a request against a clone of the app. `token` adds a Bearer
/// header; `body` is serialized as JSON.
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    request(app, Method::GET, uri, token, None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    request(app, Method::POST, uri, token, Some(body)).await
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Auth helpers
// ---------------------------------------------------------------------------

/// Register a user and return their bearer token.
pub async fn register_user(app: &Router, username: &str) -> String {
    let response = post(
        app,
        "/api/v1/auth/register",
        None,
        serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct-horse-battery",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

/// Create a title via the API and return its id.
pub async fn create_title(app: &Router, token: &str, text: &str) -> i64 {
    let response = post(
        app,
        "/api/v1/titles",
        Some(token),
        serde_json::json!({ "title": text }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    json["id"].as_i64().unwrap()
}

/// Poll the status endpoint until every painting is terminal.
pub async fn wait_for_terminal(app: &Router, token: &str, title_id: i64) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app, &format!("/api/v1/paintings/{title_id}"), Some(token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;

        let paintings = json["paintings"].as_array().unwrap();
        let all_terminal = !paintings.is_empty()
            && paintings
                .iter()
                .all(|p| p["status"] == "completed" || p["status"] == "failed");
        if all_terminal {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("paintings for title {title_id} did not settle in time");
}
