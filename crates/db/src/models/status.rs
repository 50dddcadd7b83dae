//! Painting lifecycle status.
//!
//! Stored as the PostgreSQL enum type `painting_status`; the wire strings
//! are the snake_case variant names and must never change, since both the
//! polling client and the database column depend on them.

use serde::{Deserialize, Serialize};

/// Progress of a single painting through the generation pipeline.
///
/// ```text
/// pending -> creating_prompt -> prompt_ready -> generating_image
///         -> processing -> completed
/// creating_prompt  -> failed   (concept generation error)
/// generating_image -> failed   (render error after retries exhausted)
/// ```
///
/// `completed` and `failed` are terminal. A retry resets a failed painting
/// to `creating_prompt` (full regenerate) or `generating_image`
/// (render-only regenerate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "painting_status", rename_all = "snake_case")]
pub enum PaintingStatus {
    Pending,
    CreatingPrompt,
    PromptReady,
    GeneratingImage,
    Processing,
    Completed,
    Failed,
}

impl PaintingStatus {
    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            PaintingStatus::Pending => "pending",
            PaintingStatus::CreatingPrompt => "creating_prompt",
            PaintingStatus::PromptReady => "prompt_ready",
            PaintingStatus::GeneratingImage => "generating_image",
            PaintingStatus::Processing => "processing",
            PaintingStatus::Completed => "completed",
            PaintingStatus::Failed => "failed",
        }
    }

    /// Whether this status ends the pipeline for the painting.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaintingStatus::Completed | PaintingStatus::Failed)
    }
}

impl std::fmt::Display for PaintingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PaintingStatus; 7] = [
        PaintingStatus::Pending,
        PaintingStatus::CreatingPrompt,
        PaintingStatus::PromptReady,
        PaintingStatus::GeneratingImage,
        PaintingStatus::Processing,
        PaintingStatus::Completed,
        PaintingStatus::Failed,
    ];

    #[test]
    fn wire_strings_are_exact() {
        let expected = [
            "pending",
            "creating_prompt",
            "prompt_ready",
            "generating_image",
            "processing",
            "completed",
            "failed",
        ];
        for (status, wire) in ALL.iter().zip(expected) {
            assert_eq!(status.as_str(), wire);
        }
    }

    #[test]
    fn serde_round_trips_wire_strings() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: PaintingStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        for status in ALL {
            let expected = matches!(
                status,
                PaintingStatus::Completed | PaintingStatus::Failed
            );
            assert_eq!(status.is_terminal(), expected, "{status}");
        }
    }
}
