//! Error type shared by both provider boundaries.

/// Errors from an external provider call.
///
/// Every variant is retryable from the orchestrator's point of view; the
/// distinction exists for logging and for the messages persisted to
/// `error_message` when retries are exhausted.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Could not reach the provider at all.
    #[error("Provider connection error: {0}")]
    Connection(String),

    /// The call exceeded its configured deadline.
    #[error("Provider call timed out after {0}s")]
    Timeout(u64),

    /// The provider answered with a non-success HTTP status.
    #[error("Provider error ({status}): {message}")]
    Http { status: u16, message: String },

    /// The provider answered 200 but the body was not what the contract
    /// promises (missing tool call, empty image data, invalid JSON).
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// Persisting the provider's result failed.
    #[error("Failed to persist provider result: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl ProviderError {
    /// Classify a transport error from `reqwest`.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else {
            ProviderError::Connection(err.to_string())
        }
    }

    /// Map a non-success HTTP status to an error with a useful message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match status {
            401 => "Authentication failed; check the provider API key".to_string(),
            404 => "Model not found; it may have been deprecated".to_string(),
            429 => "Rate limit exceeded; try again later".to_string(),
            _ => body.to_string(),
        };
        ProviderError::Http { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_get_specific_messages() {
        let auth = ProviderError::from_status(401, "ignored");
        assert!(auth.to_string().contains("API key"));

        let rate = ProviderError::from_status(429, "ignored");
        assert!(rate.to_string().contains("Rate limit"));

        let model = ProviderError::from_status(404, "ignored");
        assert!(model.to_string().contains("Model not found"));
    }

    #[test]
    fn unknown_status_keeps_body() {
        let err = ProviderError::from_status(500, "upstream exploded");
        assert!(err.to_string().contains("upstream exploded"));
    }
}
