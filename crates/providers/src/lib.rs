//! Boundaries to the external AI providers.
//!
//! Two capabilities live behind traits here:
//! - [`ConceptGenerator`](concept::ConceptGenerator) -- text/vision model
//!   producing one (summary, full prompt) pair per painting,
//! - [`ImageRenderer`](render::ImageRenderer) -- image model rendering a
//!   final image from a full prompt.
//!
//! The HTTP implementations own request shaping, response parsing, and
//! result persistence; retry policy and failure-status persistence belong
//! to the orchestrator in `atelier-pipeline`.

pub mod concept;
pub mod config;
pub mod error;
pub mod render;

pub use concept::{ConceptContext, ConceptGenerator, HttpConceptGenerator};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use render::{HttpImageRenderer, ImageRenderer, RenderResult};
