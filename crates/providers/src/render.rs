//! Image rendering boundary.
//!
//! [`HttpImageRenderer`] marks the painting `processing`, optionally runs
//! a vision analysis of the reference images to build subject-matching
//! scaffolding, calls the image-generation endpoint, and persists the
//! completed result. Failures are returned to the caller untouched -- the
//! orchestrator's retry wrapper owns failure-status persistence.

use async_trait::async_trait;
use atelier_core::prompt;
use atelier_core::types::DbId;
use atelier_db::models::reference::ReferencePayload;
use atelier_db::models::status::PaintingStatus;
use atelier_db::repositories::PaintingRepo;
use atelier_db::DbPool;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// How many reference images the vision analysis looks at. More adds
/// latency without improving the match.
const MAX_ANALYSIS_REFERENCES: usize = 2;

/// Fallback analysis used when the vision call itself fails; rendering
/// should not die because the analysis did.
const FALLBACK_ANALYSIS: &str = "Professional portrait photography of a person with studio \
     lighting, realistic rendering, clean composition, and natural pose.";

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub painting_id: DbId,
    pub image_url: String,
    pub image_data: String,
    /// Reference ids actually supplied to the render call.
    pub used_reference_ids: Vec<DbId>,
}

/// Renders a final image from a full prompt.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render the image for one painting and persist the completed result.
    ///
    /// On error, nothing about the failure is persisted here; the caller
    /// decides between retry and terminal failure.
    async fn render(
        &self,
        painting_id: DbId,
        idea_id: DbId,
        full_prompt: &str,
        references: &[ReferencePayload],
    ) -> Result<RenderResult, ProviderError>;
}

/// HTTP implementation backed by an OpenAI-style images endpoint, with a
/// vision chat call for reference analysis.
pub struct HttpImageRenderer {
    http: reqwest::Client,
    pool: DbPool,
    config: ProviderConfig,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Debug, Deserialize)]
struct VisionChoice {
    message: VisionMessage,
}

#[derive(Debug, Deserialize)]
struct VisionMessage {
    content: Option<String>,
}

impl HttpImageRenderer {
    pub fn new(http: reqwest::Client, pool: DbPool, config: ProviderConfig) -> Self {
        Self { http, pool, config }
    }

    /// Describe the reference images with the vision model so the render
    /// prompt can demand a matching subject and style. Falls back to a
    /// generic description if the analysis call fails.
    async fn analyze_references(&self, references: &[ReferencePayload]) -> String {
        let images: Vec<serde_json::Value> = references
            .iter()
            .take(MAX_ANALYSIS_REFERENCES)
            .map(|r| {
                json!({
                    "type": "image_url",
                    "image_url": { "url": r.image_data, "detail": "high" }
                })
            })
            .collect();

        let mut content = vec![json!({
            "type": "text",
            "text": "Describe the main subject (type, age and gender if a person, pose), visual style and medium, lighting and mood, composition and framing, and color treatment of these reference images, as exact specifications for generating a matching image. Name the subject type explicitly."
        })];
        content.extend(images);

        let body = json!({
            "model": self.config.vision_model,
            "max_tokens": 1200,
            "temperature": 0.1,
            "messages": [{ "role": "user", "content": content }]
        });

        let url = format!("{}/chat/completions", self.config.render_api_url);
        let result = self
            .http
            .post(&url)
            .bearer_auth(&self.config.render_api_key)
            .timeout(self.config.render_timeout)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => response
                .json::<VisionResponse>()
                .await
                .ok()
                .and_then(|r| r.choices.into_iter().next())
                .and_then(|c| c.message.content)
                .unwrap_or_else(|| FALLBACK_ANALYSIS.to_string()),
            Ok(response) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    "Reference analysis failed, using fallback",
                );
                FALLBACK_ANALYSIS.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reference analysis failed, using fallback");
                FALLBACK_ANALYSIS.to_string()
            }
        }
    }
}

#[async_trait]
impl ImageRenderer for HttpImageRenderer {
    async fn render(
        &self,
        painting_id: DbId,
        idea_id: DbId,
        full_prompt: &str,
        references: &[ReferencePayload],
    ) -> Result<RenderResult, ProviderError> {
        let timeout_secs = self.config.render_timeout.as_secs();

        // Request dispatched to the provider; distinct from
        // `generating_image` which covers the whole attempt.
        PaintingRepo::set_status(&self.pool, painting_id, PaintingStatus::Processing).await?;

        let final_prompt = if references.is_empty() {
            full_prompt.to_string()
        } else {
            let analysis = self.analyze_references(references).await;
            prompt::subject_matched_prompt(full_prompt, &analysis)
        };

        let body = json!({
            "model": self.config.render_model,
            "prompt": prompt::clamp_render_prompt(&final_prompt),
            "size": "1024x1024",
            "quality": "hd",
            "style": "natural",
            "n": 1,
            "response_format": "b64_json"
        });

        tracing::debug!(painting_id, idea_id, "Dispatching render request");

        let url = format!("{}/images/generations", self.config.render_api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.render_api_key)
            .timeout(self.config.render_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed("No image data in render response".to_string())
            })?;

        // Serving the raw bytes is the storage collaborator's job; the
        // row carries the inline payload plus a stable url for it.
        let image_url = format!(
            "generated/painting_{painting_id}_{}.png",
            uuid::Uuid::new_v4()
        );
        let image_data = format!("data:image/png;base64,{b64}");
        let used_reference_ids: Vec<DbId> = references.iter().map(|r| r.id).collect();

        PaintingRepo::complete(
            &self.pool,
            painting_id,
            &image_url,
            &image_data,
            &used_reference_ids,
        )
        .await?;

        tracing::info!(painting_id, idea_id, "Render completed");

        Ok(RenderResult {
            painting_id,
            image_url,
            image_data,
            used_reference_ids,
        })
    }
}
