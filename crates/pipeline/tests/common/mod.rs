//! Shared fixtures for pipeline integration tests: database seeding
//! helpers and stub providers that record what the orchestrator fed them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::types::DbId;
use atelier_db::models::idea::{CreateIdea, Idea};
use atelier_db::models::painting::Painting;
use atelier_db::models::reference::ReferencePayload;
use atelier_db::models::title::{CreateTitle, Title};
use atelier_db::repositories::{IdeaRepo, PaintingRepo, TitleRepo, UserRepo};
use atelier_providers::{
    ConceptContext, ConceptGenerator, ImageRenderer, ProviderError, RenderResult,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool) -> DbId {
    UserRepo::create(pool, "tester", "tester@example.com", "not-a-real-hash")
        .await
        .expect("user insert should succeed")
        .id
}

pub async fn seed_title(pool: &PgPool, user_id: DbId, text: &str) -> Title {
    TitleRepo::create(
        pool,
        user_id,
        &CreateTitle {
            title: text.to_string(),
            instructions: None,
        },
    )
    .await
    .expect("title insert should succeed")
}

/// Poll until every painting of the title is terminal, or panic.
pub async fn wait_for_terminal(pool: &PgPool, title_id: DbId) -> Vec<Painting> {
    for _ in 0..500 {
        let paintings = PaintingRepo::list_by_title(pool, title_id)
            .await
            .expect("painting listing should succeed");
        if !paintings.is_empty() && paintings.iter().all(|p| p.status.is_terminal()) {
            return paintings;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("paintings for title {title_id} did not reach a terminal status in time");
}

// ---------------------------------------------------------------------------
// Stub concept generator
// ---------------------------------------------------------------------------

/// Deterministic concept stub. Records the novelty context of every call
/// and fails on configured call indices (0-based).
pub struct StubConceptGenerator {
    pool: PgPool,
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    /// `prior_summaries` exactly as received, one entry per call.
    pub seen_priors: Mutex<Vec<Vec<String>>>,
}

impl StubConceptGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self::failing_on(pool, [])
    }

    pub fn failing_on(pool: PgPool, fail_on: impl IntoIterator<Item = usize>) -> Self {
        Self {
            pool,
            calls: AtomicUsize::new(0),
            fail_on: fail_on.into_iter().collect(),
            seen_priors: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConceptGenerator for StubConceptGenerator {
    async fn generate(&self, ctx: &ConceptContext) -> Result<Idea, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_priors
            .lock()
            .unwrap()
            .push(ctx.prior_summaries.clone());

        if self.fail_on.contains(&index) {
            return Err(ProviderError::Malformed(format!(
                "stub concept failure at call {index}"
            )));
        }

        let idea = IdeaRepo::create(
            &self.pool,
            &CreateIdea {
                title_id: ctx.title_id,
                summary: format!("stub idea {index}"),
                full_prompt: format!("stub prompt {index} for {}", ctx.title_text),
            },
        )
        .await?;
        Ok(idea)
    }
}

// ---------------------------------------------------------------------------
// Stub image renderer
// ---------------------------------------------------------------------------

/// Deterministic render stub. Tracks the in-flight gauge (to verify the
/// concurrency ceiling) and fails a configurable number of render calls
/// before succeeding.
pub struct StubImageRenderer {
    pool: PgPool,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    failures_remaining: AtomicUsize,
    hold: Duration,
}

impl StubImageRenderer {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            hold: Duration::from_millis(5),
        }
    }

    /// Hold each render open long enough for overlap to be observable.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Make the next `count` render calls fail. Set before starting the
    /// batch so there is no race with the background task.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl ImageRenderer for StubImageRenderer {
    async fn render(
        &self,
        painting_id: DbId,
        _idea_id: DbId,
        full_prompt: &str,
        references: &[ReferencePayload],
    ) -> Result<RenderResult, ProviderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;

        let outcome = if self.take_failure() {
            Err(ProviderError::Http {
                status: 500,
                message: "stub render failure".to_string(),
            })
        } else {
            let image_url = format!("generated/stub_{painting_id}.png");
            let image_data = format!("data:image/png;base64,stub-{full_prompt}");
            let used: Vec<DbId> = references.iter().map(|r| r.id).collect();
            PaintingRepo::complete(&self.pool, painting_id, &image_url, &image_data, &used)
                .await?;
            Ok(RenderResult {
                painting_id,
                image_url,
                image_data,
                used_reference_ids: used,
            })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
