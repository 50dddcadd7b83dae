//! Provider configuration loaded from environment variables.

use std::time::Duration;

/// Default concept-call deadline in seconds.
const DEFAULT_CONCEPT_TIMEOUT_SECS: u64 = 30;

/// Default render-call deadline in seconds. Image synthesis is slow, so
/// this is deliberately much longer than the concept deadline.
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;

/// Endpoints, credentials, and deadlines for both providers.
///
/// | Env Var                | Required | Default                                        |
/// |------------------------|----------|------------------------------------------------|
/// | `CONCEPT_API_URL`      | no       | `https://openrouter.ai/api/v1/chat/completions`|
/// | `CONCEPT_API_KEY`      | **yes**  | --                                             |
/// | `CONCEPT_MODEL`        | no       | `google/gemini-2.5-flash-preview`              |
/// | `RENDER_API_URL`       | no       | `https://api.openai.com/v1`                    |
/// | `RENDER_API_KEY`       | **yes**  | --                                             |
/// | `RENDER_MODEL`         | no       | `dall-e-3`                                     |
/// | `VISION_MODEL`         | no       | `gpt-4o`                                       |
/// | `CONCEPT_TIMEOUT_SECS` | no       | `30`                                           |
/// | `RENDER_TIMEOUT_SECS`  | no       | `120`                                          |
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Full URL of the chat-completions endpoint used for concepts.
    pub concept_api_url: String,
    pub concept_api_key: String,
    pub concept_model: String,
    /// Base URL of the image provider (endpoints are appended).
    pub render_api_url: String,
    pub render_api_key: String,
    pub render_model: String,
    /// Vision model used to analyze reference images before rendering.
    pub vision_model: String,
    pub concept_timeout: Duration,
    pub render_timeout: Duration,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if either API key is missing; the server cannot do anything
    /// useful without them.
    pub fn from_env() -> Self {
        let concept_api_url = std::env::var("CONCEPT_API_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".into());
        let concept_api_key =
            std::env::var("CONCEPT_API_KEY").expect("CONCEPT_API_KEY must be set");
        let concept_model = std::env::var("CONCEPT_MODEL")
            .unwrap_or_else(|_| "google/gemini-2.5-flash-preview".into());

        let render_api_url = std::env::var("RENDER_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let render_api_key = std::env::var("RENDER_API_KEY").expect("RENDER_API_KEY must be set");
        let render_model = std::env::var("RENDER_MODEL").unwrap_or_else(|_| "dall-e-3".into());
        let vision_model = std::env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".into());

        let concept_timeout_secs: u64 = std::env::var("CONCEPT_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_CONCEPT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("CONCEPT_TIMEOUT_SECS must be a valid u64");
        let render_timeout_secs: u64 = std::env::var("RENDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_RENDER_TIMEOUT_SECS.to_string())
            .parse()
            .expect("RENDER_TIMEOUT_SECS must be a valid u64");

        Self {
            concept_api_url,
            concept_api_key,
            concept_model,
            render_api_url,
            render_api_key,
            render_model,
            vision_model,
            concept_timeout: Duration::from_secs(concept_timeout_secs),
            render_timeout: Duration::from_secs(render_timeout_secs),
        }
    }
}
