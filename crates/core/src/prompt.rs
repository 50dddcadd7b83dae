//! Prompt shaping for the concept and render providers.
//!
//! Three concerns live here:
//! - novelty context: folding prior idea summaries into the concept request
//!   so each new idea is steered away from duplicating earlier ones,
//! - reference steering: wrapping a render prompt in subject/style-matching
//!   scaffolding built from a vision analysis of the reference images,
//! - the style-word safety net: a post-hoc substitution pass that rewrites
//!   style words the steering forbids when references are in play.

use std::sync::OnceLock;

use regex::Regex;

/// Hard cap on the prompt text sent to the image provider.
pub const MAX_RENDER_PROMPT_LEN: usize = 4000;

/// Style words that contradict reference matching, with their grounded
/// replacements. Applied case-insensitively on word boundaries.
const STYLE_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("abstract", "realistic"),
    ("surreal", "lifelike"),
    ("surrealist", "lifelike"),
    ("fantasy", "naturalistic"),
    ("cartoon", "photographic"),
    ("anime", "photographic"),
    ("dreamlike", "true-to-life"),
];

// ---------------------------------------------------------------------------
// Novelty context
// ---------------------------------------------------------------------------

/// Build the prior-ideas context block for a concept request.
///
/// Returns an empty string when there is nothing to steer away from.
pub fn novelty_context(prior_summaries: &[String]) -> String {
    if prior_summaries.is_empty() {
        return String::new();
    }
    format!("Previous painting ideas: {}", prior_summaries.join("; "))
}

// ---------------------------------------------------------------------------
// Reference steering
// ---------------------------------------------------------------------------

/// Wrap a render prompt in subject/style-matching scaffolding.
///
/// `analysis` is the vision model's description of the reference images.
/// The scaffolding instructs the image provider to match the reference
/// subject type and visual treatment while rendering the idea described by
/// `original`.
pub fn subject_matched_prompt(original: &str, analysis: &str) -> String {
    format!(
        "REFERENCE IMAGE ANALYSIS (MUST MATCH):\n{analysis}\n\n\
         Match the subject type, pose, lighting, composition, and color \
         treatment described above. Do not drift into abstract, surreal, or \
         fantasy styling unless the reference itself is abstract.\n\n\
         SUBJECT TO RENDER IN THAT STYLE:\n{original}"
    )
}

/// Rewrite disallowed style words in a render prompt.
///
/// Used as a safety net after reference steering: the concept model
/// occasionally emits style words that contradict the reference match, and
/// this pass replaces each of them with a grounded alternative. Words are
/// matched case-insensitively on word boundaries; all other text is left
/// untouched.
pub fn sanitize_style_words(prompt: &str) -> String {
    let mut result = prompt.to_string();
    for (pattern, replacement) in substitution_patterns() {
        result = pattern.replace_all(&result, *replacement).into_owned();
    }
    result
}

/// Clamp a final render prompt to the provider's accepted length.
pub fn clamp_render_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= MAX_RENDER_PROMPT_LEN {
        return prompt.to_string();
    }
    prompt.chars().take(MAX_RENDER_PROMPT_LEN).collect()
}

/// Compiled substitution patterns, built once.
fn substitution_patterns() -> &'static Vec<(Regex, &'static str)> {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        STYLE_SUBSTITUTIONS
            .iter()
            .map(|(word, replacement)| {
                let pattern = Regex::new(&format!(r"(?i)\b{word}\b"))
                    .expect("style substitution pattern must compile");
                (pattern, *replacement)
            })
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
