//! The asynchronous multi-stage generation pipeline.
//!
//! [`GenerationOrchestrator`](orchestrator::GenerationOrchestrator) fans a
//! batch request into a strictly sequential concept phase and a
//! bounded-concurrency render phase, persisting per-painting status at
//! every transition. [`StatusService`](status::StatusService) is the read
//! path the polling client reconciles against. [`GenerationRegistry`]
//! (registry) tracks in-flight batches for observability only.

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod retry;
pub mod status;

pub use error::PipelineError;
pub use orchestrator::{GenerationOrchestrator, RetryMode, StartedBatch};
pub use registry::{BatchPhase, GenerationRegistry};
pub use retry::RetryPolicy;
pub use status::StatusService;
