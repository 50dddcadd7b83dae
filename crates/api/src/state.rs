use std::sync::Arc;

use atelier_pipeline::{GenerationOrchestrator, GenerationRegistry};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is itself a
/// handle).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: atelier_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// The generation pipeline coordinator.
    pub orchestrator: GenerationOrchestrator,
    /// In-flight batch registry (observability only).
    pub registry: GenerationRegistry,
}
