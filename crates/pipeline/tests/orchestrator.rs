//! Integration tests for the generation orchestrator: placeholder
//! semantics, novelty-context ordering, render concurrency, retry
//! behavior, and partial-failure isolation. External providers are
//! deterministic stubs from `common`.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use atelier_core::error::CoreError;
use atelier_db::models::status::PaintingStatus;
use atelier_db::repositories::PaintingRepo;
use atelier_pipeline::{
    GenerationOrchestrator, GenerationRegistry, PipelineError, RetryMode, RetryPolicy,
};
use common::{seed_title, seed_user, wait_for_terminal, StubConceptGenerator, StubImageRenderer};
use sqlx::PgPool;

/// Retry policy with no real waiting, so tests run fast.
fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 2,
        base_delay: Duration::ZERO,
    }
}

fn orchestrator(
    pool: &PgPool,
    concepts: Arc<StubConceptGenerator>,
    renderer: Arc<StubImageRenderer>,
) -> GenerationOrchestrator {
    GenerationOrchestrator::new(pool.clone(), concepts, renderer, GenerationRegistry::new())
        .with_retry(fast_retry())
        .with_inter_chunk_delay(Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn start_returns_placeholders_in_creating_prompt(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, renderer);

    let placeholders = orch.start(&title, 4).await.unwrap().paintings;

    assert_eq!(placeholders.len(), 4);
    for p in &placeholders {
        assert_eq!(p.status, PaintingStatus::CreatingPrompt);
        assert_eq!(p.idea_id, None);
        assert_eq!(p.image_data, None);
    }

    wait_for_terminal(&pool, title.id).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn quantity_bounds_are_inclusive(pool: PgPool) {
    let user_id = seed_user(&pool).await;

    for quantity in [1u32, 10] {
        let title = seed_title(&pool, user_id, &format!("Batch of {quantity}")).await;
        let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
        let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
        let orch = orchestrator(&pool, concepts, renderer);

        let placeholders = orch.start(&title, quantity).await.unwrap().paintings;
        assert_eq!(placeholders.len(), quantity as usize);
        wait_for_terminal(&pool, title.id).await;
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_quantity_rejected_with_zero_rows(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, renderer);

    for quantity in [0u32, 11, 100] {
        let err = orch.start(&title, quantity).await.unwrap_err();
        assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
    }

    let rows = PaintingRepo::list_by_title(&pool, title.id).await.unwrap();
    assert!(rows.is_empty(), "rejected requests must persist nothing");
}

// ---------------------------------------------------------------------------
// Concept phase ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn novelty_context_grows_across_the_batch(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, Arc::clone(&concepts), renderer);

    orch.start(&title, 3).await.unwrap();
    wait_for_terminal(&pool, title.id).await;

    let seen = concepts.seen_priors.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    // Call 0 sees no priors; call i sees every summary generated before it.
    assert!(seen[0].is_empty());
    assert_eq!(seen[1], vec!["stub idea 0".to_string()]);
    assert_eq!(
        seen[2],
        vec!["stub idea 0".to_string(), "stub idea 1".to_string()]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn preexisting_ideas_are_part_of_the_novelty_context(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    // First batch leaves one idea behind.
    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, Arc::clone(&concepts), Arc::clone(&renderer));
    orch.start(&title, 1).await.unwrap();
    wait_for_terminal(&pool, title.id).await;

    // Second batch must see it before generating anything new.
    let concepts2 = Arc::new(StubConceptGenerator::new(pool.clone()));
    let orch2 = orchestrator(&pool, Arc::clone(&concepts2), renderer);
    orch2.start(&title, 1).await.unwrap();
    wait_for_terminal(&pool, title.id).await;

    let seen = concepts2.seen_priors.lock().unwrap().clone();
    assert_eq!(seen[0], vec!["stub idea 0".to_string()]);
}

// ---------------------------------------------------------------------------
// Render phase concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn render_concurrency_never_exceeds_ceiling(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(
        StubImageRenderer::new(pool.clone()).with_hold(Duration::from_millis(30)),
    );
    let orch = orchestrator(&pool, concepts, Arc::clone(&renderer))
        .with_render_concurrency(3);

    orch.start(&title, 8).await.unwrap();
    let paintings = wait_for_terminal(&pool, title.id).await;

    assert_eq!(paintings.len(), 8);
    assert!(paintings
        .iter()
        .all(|p| p.status == PaintingStatus::Completed));

    let max = renderer.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "observed {max} simultaneous renders, ceiling is 3");
    assert!(max >= 2, "renders never overlapped; gauge is not measuring");
}

// ---------------------------------------------------------------------------
// Retry behavior
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn render_failure_then_success_completes(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, Arc::clone(&renderer));

    renderer.fail_next(1);
    orch.start(&title, 1).await.unwrap();

    let paintings = wait_for_terminal(&pool, title.id).await;
    assert_eq!(paintings[0].status, PaintingStatus::Completed);
    assert_eq!(paintings[0].error_message, None);
    assert!(!paintings[0].image_data.as_deref().unwrap_or("").is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn render_retries_exhausted_marks_failed(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, Arc::clone(&renderer));

    renderer.fail_next(2);
    orch.start(&title, 1).await.unwrap();

    let paintings = wait_for_terminal(&pool, title.id).await;
    assert_eq!(paintings[0].status, PaintingStatus::Failed);
    let message = paintings[0].error_message.as_deref().unwrap();
    assert!(message.contains("Failed after 2 attempts"), "got: {message}");
    assert_eq!(paintings[0].image_data, None);
}

// ---------------------------------------------------------------------------
// Partial failure isolation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn concept_failure_does_not_abort_the_batch(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    // Concept call index 1 (the middle painting) fails.
    let concepts = Arc::new(StubConceptGenerator::failing_on(pool.clone(), [1]));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, renderer);

    let placeholders = orch.start(&title, 3).await.unwrap().paintings;
    wait_for_terminal(&pool, title.id).await;

    // list_by_title is newest-first; look items up by id instead.
    let first = PaintingRepo::find_by_id(&pool, placeholders[0].id)
        .await
        .unwrap()
        .unwrap();
    let second = PaintingRepo::find_by_id(&pool, placeholders[1].id)
        .await
        .unwrap()
        .unwrap();
    let third = PaintingRepo::find_by_id(&pool, placeholders[2].id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.status, PaintingStatus::Completed);
    assert_eq!(third.status, PaintingStatus::Completed);
    assert_eq!(second.status, PaintingStatus::Failed);
    assert!(second
        .error_message
        .as_deref()
        .unwrap()
        .contains("Failed to generate prompt"));
}

// ---------------------------------------------------------------------------
// Single-item retry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn full_retry_succeeds_without_touching_siblings(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::failing_on(pool.clone(), [0]));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, Arc::clone(&concepts), renderer);

    let placeholders = orch.start(&title, 2).await.unwrap().paintings;
    wait_for_terminal(&pool, title.id).await;

    let failed_id = placeholders[0].id;
    let sibling_id = placeholders[1].id;
    let sibling_before = PaintingRepo::find_by_id(&pool, sibling_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sibling_before.status, PaintingStatus::Completed);

    // Retry the failed item; the stub concept succeeds from call 1 on.
    let detail = PaintingRepo::find_detail(&pool, failed_id)
        .await
        .unwrap()
        .unwrap();
    orch.retry_single(&detail, RetryMode::Full).await.unwrap();
    wait_for_terminal(&pool, title.id).await;

    let retried = PaintingRepo::find_by_id(&pool, failed_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retried.status, PaintingStatus::Completed);
    assert!(retried.idea_id.is_some(), "full retry must attach a fresh idea");

    let sibling_after = PaintingRepo::find_by_id(&pool, sibling_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sibling_after.status, PaintingStatus::Completed);
    assert_eq!(sibling_after.idea_id, sibling_before.idea_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn render_only_retry_reuses_the_existing_idea(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, Arc::clone(&renderer));

    renderer.fail_next(2);
    let placeholders = orch.start(&title, 1).await.unwrap().paintings;
    let painting_id = placeholders[0].id;

    let paintings = wait_for_terminal(&pool, title.id).await;
    assert_eq!(paintings[0].status, PaintingStatus::Failed);
    let original_idea = paintings[0].idea_id.expect("idea survived the failure");

    let detail = PaintingRepo::find_detail(&pool, painting_id)
        .await
        .unwrap()
        .unwrap();
    orch.retry_single(&detail, RetryMode::RenderOnly)
        .await
        .unwrap();
    wait_for_terminal(&pool, title.id).await;

    let retried = PaintingRepo::find_by_id(&pool, painting_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retried.status, PaintingStatus::Completed);
    assert_eq!(retried.idea_id, Some(original_idea));
}

#[sqlx::test(migrations = "../../migrations")]
async fn render_only_retry_without_idea_is_rejected(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    // A bare placeholder that never got a concept.
    let placeholder = PaintingRepo::create_placeholder(&pool, title.id)
        .await
        .unwrap();
    let detail = PaintingRepo::find_detail(&pool, placeholder.id)
        .await
        .unwrap()
        .unwrap();

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, renderer);

    let err = orch
        .retry_single(&detail, RetryMode::RenderOnly)
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sunset_batch_of_two_completes_end_to_end(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let title = seed_title(&pool, user_id, "Sunset").await;

    let concepts = Arc::new(StubConceptGenerator::new(pool.clone()));
    let renderer = Arc::new(StubImageRenderer::new(pool.clone()));
    let orch = orchestrator(&pool, concepts, renderer);

    let placeholders = orch.start(&title, 2).await.unwrap().paintings;
    assert_eq!(placeholders.len(), 2);
    wait_for_terminal(&pool, title.id).await;

    let status = atelier_pipeline::StatusService::get_status(&pool, title.id)
        .await
        .unwrap();
    assert_eq!(status.paintings.len(), 2);
    for view in &status.paintings {
        assert_eq!(view.status, PaintingStatus::Completed);
        assert!(!view.image_data.is_empty());
        assert!(!view.full_prompt.is_empty());
    }
}
