//! The generation pipeline coordinator.
//!
//! `start` creates placeholder rows synchronously and returns them, then
//! runs the batch in a detached task: a strictly sequential concept phase
//! (novelty context must be causally ordered) followed by a render phase
//! bounded at a concurrency ceiling, with bounded retry per render task.
//! Every failure is persisted to the one painting row the failing task
//! owns; nothing escapes the background task boundary.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::error::CoreError;
use atelier_core::generation;
use atelier_core::types::DbId;
use atelier_db::models::idea::Idea;
use atelier_db::models::painting::{Painting, PaintingDetail};
use atelier_db::models::reference::ReferencePayload;
use atelier_db::models::status::PaintingStatus;
use atelier_db::models::title::Title;
use atelier_db::repositories::{IdeaRepo, PaintingRepo, ReferenceRepo};
use atelier_db::DbPool;
use atelier_providers::{ConceptContext, ConceptGenerator, ImageRenderer};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::registry::{BatchPhase, GenerationRegistry};
use crate::retry::RetryPolicy;

/// Which phase a single-item retry re-enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Full pipeline restart: fresh idea, then render.
    Full,
    /// Render-only restart: reuse the existing idea.
    RenderOnly,
}

/// What `start` hands back before the background task begins: the
/// placeholder rows plus how many references will feed the batch.
#[derive(Debug, Clone)]
pub struct StartedBatch {
    pub paintings: Vec<Painting>,
    pub reference_count: usize,
}

/// Coordinates concept and render phases for generation batches.
///
/// Cheap to clone; all fields are handles.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    pool: DbPool,
    concepts: Arc<dyn ConceptGenerator>,
    renderer: Arc<dyn ImageRenderer>,
    registry: GenerationRegistry,
    render_concurrency: usize,
    retry: RetryPolicy,
    inter_chunk_delay: Duration,
}

impl GenerationOrchestrator {
    pub fn new(
        pool: DbPool,
        concepts: Arc<dyn ConceptGenerator>,
        renderer: Arc<dyn ImageRenderer>,
        registry: GenerationRegistry,
    ) -> Self {
        Self {
            pool,
            concepts,
            renderer,
            registry,
            render_concurrency: generation::DEFAULT_RENDER_CONCURRENCY,
            retry: RetryPolicy::default(),
            inter_chunk_delay: generation::INTER_CHUNK_DELAY,
        }
    }

    /// Override the render concurrency ceiling.
    pub fn with_render_concurrency(mut self, ceiling: usize) -> Self {
        self.render_concurrency = ceiling.max(1);
        self
    }

    /// Override the render retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the cooperative pause between render chunks.
    pub fn with_inter_chunk_delay(mut self, delay: Duration) -> Self {
        self.inter_chunk_delay = delay;
        self
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    /// Start a generation batch for an already-authorized title.
    ///
    /// Synchronously creates `quantity` placeholder paintings in
    /// `creating_prompt` and returns them; the concept and render phases
    /// run in a detached task. A placeholder insert failure fails the
    /// whole call -- no partial placeholder set is ever returned.
    pub async fn start(
        &self,
        title: &Title,
        quantity: u32,
    ) -> Result<StartedBatch, PipelineError> {
        generation::validate_quantity(quantity).map_err(PipelineError::Core)?;

        let references =
            ReferenceRepo::list_for_generation(&self.pool, title.id, title.user_id).await?;
        let reference_count = references.len();
        let prior_summaries = IdeaRepo::list_summaries_by_title(&self.pool, title.id).await?;

        let mut placeholders = Vec::with_capacity(quantity as usize);
        for _ in 0..quantity {
            placeholders.push(PaintingRepo::create_placeholder(&self.pool, title.id).await?);
        }

        let batch_id = self.registry.register(title.id, placeholders.len());
        tracing::info!(
            title_id = title.id,
            quantity,
            %batch_id,
            references = reference_count,
            "Generation batch started",
        );

        let this = self.clone();
        let title = title.clone();
        let batch = placeholders.clone();
        tokio::spawn(async move {
            this.run_batch(batch_id, &title, references, prior_summaries, batch)
                .await;
            this.registry.finish(batch_id);
        });

        Ok(StartedBatch {
            paintings: placeholders,
            reference_count,
        })
    }

    // -----------------------------------------------------------------------
    // retry_single
    // -----------------------------------------------------------------------

    /// Restart the pipeline for one painting, independent of any other
    /// in-flight batch. Ownership is checked by the caller.
    pub async fn retry_single(
        &self,
        detail: &PaintingDetail,
        mode: RetryMode,
    ) -> Result<(), PipelineError> {
        let references =
            ReferenceRepo::list_for_generation(&self.pool, detail.title_id, detail.user_id)
                .await?;

        match mode {
            RetryMode::Full => {
                PaintingRepo::reset_for_regenerate(&self.pool, detail.id).await?;

                let prior_summaries =
                    IdeaRepo::list_summaries_by_title(&self.pool, detail.title_id).await?;
                let batch_id = self.registry.register(detail.title_id, 1);
                tracing::info!(painting_id = detail.id, %batch_id, "Full regenerate started");

                let this = self.clone();
                let detail = detail.clone();
                tokio::spawn(async move {
                    this.regenerate_one(batch_id, &detail, references, prior_summaries)
                        .await;
                    this.registry.finish(batch_id);
                });
            }
            RetryMode::RenderOnly => {
                let idea_id = detail.idea_id.ok_or_else(|| {
                    PipelineError::Core(CoreError::Validation(
                        "Painting has no idea yet; use a full regenerate".to_string(),
                    ))
                })?;
                let idea = IdeaRepo::find_by_id(&self.pool, idea_id)
                    .await?
                    .ok_or(PipelineError::Core(CoreError::NotFound {
                        entity: "Idea",
                        id: idea_id,
                    }))?;

                PaintingRepo::reset_for_rerender(&self.pool, detail.id).await?;

                let batch_id = self.registry.register(detail.title_id, 1);
                tracing::info!(painting_id = detail.id, %batch_id, "Render-only retry started");

                let this = self.clone();
                let painting_id = detail.id;
                tokio::spawn(async move {
                    this.registry.set_phase(batch_id, BatchPhase::Render);
                    this.render_one(painting_id, &idea, &references).await;
                    this.registry.item_settled(batch_id);
                    this.registry.finish(batch_id);
                });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Batch execution (background)
    // -----------------------------------------------------------------------

    /// Run both phases for a batch. Never returns an error: every failure
    /// lands on the painting row it belongs to.
    async fn run_batch(
        &self,
        batch_id: Uuid,
        title: &Title,
        references: Vec<ReferencePayload>,
        prior_summaries: Vec<String>,
        placeholders: Vec<Painting>,
    ) {
        // --- Concept phase: strictly sequential. Each call sees every
        // summary generated earlier in this batch so novelty steering is
        // causally ordered.
        let mut summaries = prior_summaries;
        let mut ready: Vec<(DbId, Idea)> = Vec::with_capacity(placeholders.len());

        for (index, painting) in placeholders.iter().enumerate() {
            let ctx = ConceptContext {
                title_id: title.id,
                title_text: title.title.clone(),
                instructions: title.instructions.clone(),
                prior_summaries: summaries.clone(),
                references: references.clone(),
            };

            match self.concepts.generate(&ctx).await {
                Ok(idea) => {
                    if let Err(e) =
                        PaintingRepo::attach_idea(&self.pool, painting.id, idea.id).await
                    {
                        tracing::error!(
                            painting_id = painting.id,
                            error = %e,
                            "Failed to attach idea",
                        );
                        self.fail_painting(painting.id, &format!("Database error: {e}"))
                            .await;
                        self.registry.item_settled(batch_id);
                        continue;
                    }
                    summaries.push(idea.summary.clone());
                    ready.push((painting.id, idea));
                }
                Err(e) => {
                    tracing::warn!(
                        title_id = title.id,
                        painting_id = painting.id,
                        index,
                        error = %e,
                        "Concept generation failed; continuing batch",
                    );
                    self.fail_painting(painting.id, &format!("Failed to generate prompt: {e}"))
                        .await;
                    self.registry.item_settled(batch_id);
                }
            }
        }

        // --- Render phase: ceiling-sized chunks, cooperative pause
        // between chunks.
        self.registry.set_phase(batch_id, BatchPhase::Render);

        let refs: &[ReferencePayload] = &references;
        let chunks: Vec<&[(DbId, Idea)]> = ready.chunks(self.render_concurrency).collect();
        let chunk_total = chunks.len();
        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            let tasks = chunk.iter().map(|(painting_id, idea)| async move {
                self.render_one(*painting_id, idea, refs).await;
                self.registry.item_settled(batch_id);
            });
            futures::future::join_all(tasks).await;

            if chunk_index + 1 < chunk_total {
                tokio::time::sleep(self.inter_chunk_delay).await;
            }
        }

        tracing::info!(title_id = title.id, %batch_id, "Generation batch finished");
    }

    /// Full-pipeline restart for a single painting.
    async fn regenerate_one(
        &self,
        batch_id: Uuid,
        detail: &PaintingDetail,
        references: Vec<ReferencePayload>,
        prior_summaries: Vec<String>,
    ) {
        let ctx = ConceptContext {
            title_id: detail.title_id,
            title_text: detail.title.clone(),
            instructions: detail.instructions.clone(),
            prior_summaries,
            references: references.clone(),
        };

        let idea = match self.concepts.generate(&ctx).await {
            Ok(idea) => idea,
            Err(e) => {
                self.fail_painting(detail.id, &format!("Regeneration failed: {e}"))
                    .await;
                self.registry.item_settled(batch_id);
                return;
            }
        };

        if let Err(e) = PaintingRepo::attach_idea(&self.pool, detail.id, idea.id).await {
            tracing::error!(painting_id = detail.id, error = %e, "Failed to attach idea");
            self.fail_painting(detail.id, &format!("Database error: {e}"))
                .await;
            self.registry.item_settled(batch_id);
            return;
        }

        self.registry.set_phase(batch_id, BatchPhase::Render);
        self.render_one(detail.id, &idea, &references).await;
        self.registry.item_settled(batch_id);
    }

    /// One render task: bounded attempt loop with computed backoff.
    ///
    /// The renderer persists success itself; this loop owns the
    /// `generating_image` transition before each attempt and the terminal
    /// `failed` transition after the last.
    async fn render_one(&self, painting_id: DbId, idea: &Idea, references: &[ReferencePayload]) {
        let mut last_error = String::new();

        for attempt in 1..=self.retry.attempts {
            if let Err(e) =
                PaintingRepo::set_status(&self.pool, painting_id, PaintingStatus::GeneratingImage)
                    .await
            {
                tracing::error!(painting_id, error = %e, "Failed to set render status");
                last_error = format!("Database error: {e}");
                break;
            }

            match self
                .renderer
                .render(painting_id, idea.id, &idea.full_prompt, references)
                .await
            {
                Ok(_) => {
                    tracing::info!(painting_id, attempt, "Render succeeded");
                    return;
                }
                Err(e) => {
                    tracing::warn!(painting_id, attempt, error = %e, "Render attempt failed");
                    last_error = e.to_string();
                    if self.retry.has_next(attempt) {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        self.fail_painting(
            painting_id,
            &format!("Failed after {} attempts: {last_error}", self.retry.attempts),
        )
        .await;
    }

    /// Persist a terminal failure, truncating the message. Best effort:
    /// a database error here is logged and dropped, because there is
    /// nowhere left to record it.
    async fn fail_painting(&self, painting_id: DbId, message: &str) {
        let message = generation::truncate_error(message);
        if let Err(e) = PaintingRepo::mark_failed(&self.pool, painting_id, &message).await {
            tracing::error!(painting_id, error = %e, "Failed to persist painting failure");
        }
    }
}
