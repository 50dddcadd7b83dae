//! Generation pipeline constants, policy, and validation.
//!
//! Pure functions shared by the orchestrator, the API handlers, and the
//! polling client. Anything that touches the database or a provider lives
//! in `atelier-pipeline` / `atelier-providers`; this module only answers
//! questions ("is this quantity valid?", "how long before attempt 2?")
//! so the policy is testable without timers or stub servers.

use std::time::Duration;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Batch limits
// ---------------------------------------------------------------------------

/// Smallest batch a single generate request may ask for.
pub const MIN_QUANTITY: u32 = 1;

/// Largest batch a single generate request may ask for.
pub const MAX_QUANTITY: u32 = 10;

// ---------------------------------------------------------------------------
// Render-phase policy
// ---------------------------------------------------------------------------

/// Maximum simultaneous in-flight render calls per batch.
pub const DEFAULT_RENDER_CONCURRENCY: usize = 3;

/// Total render attempts per painting (1 initial + retries).
pub const DEFAULT_RENDER_ATTEMPTS: u32 = 2;

/// Base delay for the render retry backoff. The delay before attempt
/// `n + 1` is `RETRY_BASE_DELAY * n`.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Cooperative pause between ceiling-sized render chunks, a courtesy to
/// the external provider's rate limits.
pub const INTER_CHUNK_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Client polling policy
// ---------------------------------------------------------------------------

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Persisted text
// ---------------------------------------------------------------------------

/// Summary shown on a placeholder before its concept exists.
pub const PLACEHOLDER_SUMMARY: &str = "Generating painting concept...";

/// Summary substituted by the status read path while a painting has no idea
/// attached yet.
pub const IN_PROGRESS_SUMMARY: &str = "Generating concept...";

/// Instructions text substituted when a title has none.
pub const NO_INSTRUCTIONS: &str = "No custom instructions provided";

/// Upper bound on persisted `error_message` length.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a requested batch quantity.
///
/// Anything outside `MIN_QUANTITY..=MAX_QUANTITY` is rejected before any
/// row is persisted.
pub fn validate_quantity(quantity: u32) -> Result<(), CoreError> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        return Err(CoreError::Validation(format!(
            "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Retry schedule
// ---------------------------------------------------------------------------

/// Delay to wait after a failed attempt before the next one.
///
/// `attempt` is 1-based (the attempt that just failed). The schedule is
/// linear-in-attempt on the base delay: 2s after attempt 1, 4s after
/// attempt 2, and so on.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}

// ---------------------------------------------------------------------------
// Error message shaping
// ---------------------------------------------------------------------------

/// Truncate a provider/database error to the persistable length.
///
/// Truncation is on a char boundary so multi-byte messages never split.
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Number of ceiling-sized chunks needed to process `items` render tasks.
pub fn chunk_count(items: usize, ceiling: usize) -> usize {
    if ceiling == 0 || items == 0 {
        return 0;
    }
    items.div_ceil(ceiling)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
