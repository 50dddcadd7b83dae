//! Concept generation boundary.
//!
//! [`HttpConceptGenerator`] calls a chat-completions endpoint with a
//! forced tool call so the model returns a structured
//! `{summary, fullPrompt}` pair, then persists the pair as a new idea row
//! before returning. Ideas are never mutated; a retry produces a fresh
//! row.

use async_trait::async_trait;
use atelier_core::prompt;
use atelier_core::types::DbId;
use atelier_db::models::idea::{CreateIdea, Idea};
use atelier_db::models::reference::ReferencePayload;
use atelier_db::repositories::IdeaRepo;
use atelier_db::DbPool;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Everything the concept provider needs to produce one idea.
#[derive(Debug, Clone)]
pub struct ConceptContext {
    pub title_id: DbId,
    pub title_text: String,
    pub instructions: Option<String>,
    /// Summaries of every prior idea (pre-existing and generated earlier
    /// in the same batch), newest first. Steers the model away from
    /// repeating itself.
    pub prior_summaries: Vec<String>,
    pub references: Vec<ReferencePayload>,
}

/// Produces one painting concept per call.
#[async_trait]
pub trait ConceptGenerator: Send + Sync {
    /// Generate and persist a new idea for the given context.
    async fn generate(&self, ctx: &ConceptContext) -> Result<Idea, ProviderError>;
}

/// HTTP implementation backed by an OpenRouter-style chat-completions
/// endpoint.
pub struct HttpConceptGenerator {
    http: reqwest::Client,
    pool: DbPool,
    config: ProviderConfig,
}

/// Tool-call arguments the model is forced to return.
#[derive(Debug, Deserialize)]
struct IdeaArgs {
    summary: String,
    #[serde(rename = "fullPrompt")]
    full_prompt: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Debug, Deserialize)]
struct ToolFunction {
    arguments: String,
}

impl HttpConceptGenerator {
    pub fn new(http: reqwest::Client, pool: DbPool, config: ProviderConfig) -> Self {
        Self { http, pool, config }
    }

    /// Build the chat request body: system role, user prompt with novelty
    /// context, and the forced `save_painting_idea` tool.
    fn request_body(&self, ctx: &ConceptContext) -> serde_json::Value {
        let novelty = prompt::novelty_context(&ctx.prior_summaries);
        let instructions = ctx
            .instructions
            .as_deref()
            .map(|i| format!("Custom instructions: {i}"))
            .unwrap_or_default();

        let user_prompt = format!(
            "Create a painting concept for the title: \"{}\".\n{}\n{}\n\
             Generate a completely new and different painting idea that has \
             not been suggested yet.",
            ctx.title_text, instructions, novelty
        );

        json!({
            "model": self.config.concept_model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a creative painting designer. Generate unique painting concepts that have not been suggested before."
                },
                { "role": "user", "content": user_prompt }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": "save_painting_idea",
                    "description": "Save a painting idea",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "summary": {
                                "type": "string",
                                "description": "A short summary of the painting idea (30-50 words)"
                            },
                            "fullPrompt": {
                                "type": "string",
                                "description": "The full prompt to generate this painting image (100-200 words with detailed visual instructions)"
                            }
                        },
                        "required": ["summary", "fullPrompt"]
                    }
                }
            }],
            "tool_choice": { "type": "function", "function": { "name": "save_painting_idea" } }
        })
    }

    /// Pull the forced tool call out of the response, or explain what was
    /// missing.
    fn extract_idea(response: ChatResponse) -> Result<IdeaArgs, ProviderError> {
        let call = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.tool_calls)
            .and_then(|calls| calls.into_iter().next())
            .ok_or_else(|| {
                ProviderError::Malformed("No tool call in concept response".to_string())
            })?;

        let args: IdeaArgs = serde_json::from_str(&call.function.arguments)
            .map_err(|e| ProviderError::Malformed(format!("Bad tool arguments: {e}")))?;

        if args.summary.is_empty() || args.full_prompt.is_empty() {
            return Err(ProviderError::Malformed(
                "Concept response missing summary or fullPrompt".to_string(),
            ));
        }
        Ok(args)
    }
}

#[async_trait]
impl ConceptGenerator for HttpConceptGenerator {
    async fn generate(&self, ctx: &ConceptContext) -> Result<Idea, ProviderError> {
        let timeout_secs = self.config.concept_timeout.as_secs();

        tracing::debug!(
            title_id = ctx.title_id,
            model = %self.config.concept_model,
            prior_ideas = ctx.prior_summaries.len(),
            "Requesting painting concept",
        );

        let response = self
            .http
            .post(&self.config.concept_api_url)
            .bearer_auth(&self.config.concept_api_key)
            .timeout(self.config.concept_timeout)
            .json(&self.request_body(ctx))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let mut args = Self::extract_idea(parsed)?;

        // Safety net: when references will steer the render toward a
        // concrete subject, scrub style words that contradict the match.
        if !ctx.references.is_empty() {
            args.full_prompt = prompt::sanitize_style_words(&args.full_prompt);
        }

        let idea = IdeaRepo::create(
            &self.pool,
            &CreateIdea {
                title_id: ctx.title_id,
                summary: args.summary,
                full_prompt: args.full_prompt,
            },
        )
        .await?;

        tracing::info!(title_id = ctx.title_id, idea_id = idea.id, "Concept generated");
        Ok(idea)
    }
}
