//! Alt text generation
//!
//! The [`AltTextGenerator`] trait is the seam between the batch processor and
//! whatever produces descriptions. [`OpenAiAltTextGenerator`] talks to any
//! chat-completions endpoint that accepts image input.

mod openai;
pub mod retry;

use async_trait::async_trait;

use crate::media::ImageField;

pub use openai::OpenAiAltTextGenerator;
pub use retry::RetryPolicy;

/// Longest alt text the image field stores
pub const MAX_ALT_LENGTH: usize = 512;

/// Outcome of one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// Generated alt text
    Success(String),
    /// Why no text was produced
    Failure(String),
}

impl GenerationResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Produces alt text for an image
///
/// Implementations own retries and timeouts; every error must come back as
/// [`GenerationResult::Failure`].
#[async_trait]
pub trait AltTextGenerator: Send + Sync {
    /// Generate alt text for the referenced image
    async fn generate(&self, image: &ImageField) -> GenerationResult;
}

/// Normalize model output into storable alt text
///
/// Trims whitespace, strips one pair of wrapping quotes and caps the length
/// at [`MAX_ALT_LENGTH`] characters. Returns `None` when nothing is left.
#[must_use]
pub fn clean_alt_text(raw: &str) -> Option<String> {
    let mut text = raw.trim();

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }

    if text.is_empty() {
        return None;
    }

    if text.chars().count() <= MAX_ALT_LENGTH {
        return Some(text.to_string());
    }

    let truncated: String = text.chars().take(MAX_ALT_LENGTH).collect();
    // Prefer cutting at the last word boundary
    let cut = truncated
        .rfind(char::is_whitespace)
        .map_or(truncated.as_str(), |i| &truncated[..i]);
    Some(cut.trim_end().to_string())
}
