//! Bulk alt text processing
//!
//! [`BulkAltTextProcessor`] walks a batch of media items strictly in order,
//! one generation call at a time. A failing item is recorded and the batch
//! moves on; only cancellation stops it early.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::generator::{AltTextGenerator, GenerationResult};
use crate::media::{MediaId, MediaItem, MediaRepository};
use crate::notify::{Notice, Notifier};

/// Detail recorded for an unresolved item
pub const DETAIL_INVALID_REFERENCE: &str = "invalid reference";
/// Detail recorded for a non-image item
pub const DETAIL_NOT_AN_IMAGE: &str = "not an image";
/// Detail recorded for an image item without a file
pub const DETAIL_MISSING_IMAGE: &str = "missing image reference";

/// Terminal status of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Succeeded,
    Skipped,
    Failed,
}

/// Outcome record for one input position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// `None` for unresolved references
    pub item_id: Option<MediaId>,
    pub status: ItemStatus,
    /// Generated text on success, reason otherwise
    pub detail: String,
}

/// Aggregate result of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Per-item records in input order
    pub items: Vec<ItemOutcome>,
    /// Processing stopped before the end of the batch
    pub cancelled: bool,
}

impl BatchOutcome {
    fn record(&mut self, item_id: Option<MediaId>, status: ItemStatus, detail: impl Into<String>) {
        match status {
            ItemStatus::Succeeded => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            ItemStatus::Failed => {
                self.attempted += 1;
                self.failed += 1;
            }
            ItemStatus::Skipped => self.skipped += 1,
        }

        self.items.push(ItemOutcome {
            item_id,
            status,
            detail: detail.into(),
        });
    }

    /// Number of input positions that were handled
    #[must_use]
    pub fn processed(&self) -> usize {
        self.items.len()
    }

    /// One-line summary of the counts
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Processed {} items: {} succeeded, {} failed, {} skipped",
            self.processed(),
            self.succeeded,
            self.failed,
            self.skipped
        );
        if self.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary
    }
}

/// Sequential alt text generator for batches of media items
pub struct BulkAltTextProcessor {
    repository: Arc<dyn MediaRepository>,
    generator: Arc<dyn AltTextGenerator>,
    notifier: Arc<dyn Notifier>,
}

impl BulkAltTextProcessor {
    #[must_use]
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        generator: Arc<dyn AltTextGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            generator,
            notifier,
        }
    }

    /// Process a batch to completion
    pub async fn process_batch(&self, items: Vec<Option<MediaItem>>) -> BatchOutcome {
        self.process_batch_with_cancel(items, &CancellationToken::new())
            .await
    }

    /// Process a batch, checking `cancel` before each item
    ///
    /// On cancellation the outcome holds only the items handled so far and
    /// has `cancelled` set.
    pub async fn process_batch_with_cancel(
        &self,
        items: Vec<Option<MediaItem>>,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        if items.is_empty() {
            self.notifier
                .notify(Notice::error("No valid media items selected."));
            return outcome;
        }

        let total = items.len();
        for (index, item) in items.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(processed = index, total, "batch cancelled");
                outcome.cancelled = true;
                break;
            }

            match item {
                None => {
                    tracing::warn!(index, "invalid media reference");
                    self.notifier.notify(Notice::warning("Invalid media reference"));
                    outcome.record(None, ItemStatus::Skipped, DETAIL_INVALID_REFERENCE);
                }
                Some(item) if !item.is_image() => {
                    tracing::warn!(media_id = item.id, bundle = %item.bundle, "media is not an image");
                    self.notifier
                        .notify(Notice::warning(format!("Media {} is not an image", item.id)));
                    outcome.record(Some(item.id), ItemStatus::Skipped, DETAIL_NOT_AN_IMAGE);
                }
                Some(item) => {
                    let (status, detail) = self.process_image(&item).await;
                    outcome.record(Some(item.id), status, detail);
                }
            }
        }

        tracing::info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            cancelled = outcome.cancelled,
            "batch finished"
        );
        self.notifier.notify(Notice::info(outcome.summary()));

        outcome
    }

    /// Generate, apply and persist alt text for one eligible item
    async fn process_image(&self, item: &MediaItem) -> (ItemStatus, String) {
        tracing::debug!(media_id = item.id, "generating alt text");

        let Some(image) = item.image_reference() else {
            return self.fail(item, DETAIL_MISSING_IMAGE.to_string());
        };

        let text = match self.generator.generate(image).await {
            GenerationResult::Success(text) => text,
            GenerationResult::Failure(reason) => return self.fail(item, reason),
        };

        // Only the copy is changed, so a failed save leaves the caller's item untouched
        let updated = item.with_alt_text(&text);
        if let Err(e) = self.repository.save(&updated) {
            return self.fail(item, e.to_string());
        }

        tracing::info!(media_id = item.id, alt = %text, "alt text generated");
        self.notifier.notify(Notice::info(format!(
            "Alt text has been generated and updated for {}.",
            item.label()
        )));

        (ItemStatus::Succeeded, text)
    }

    fn fail(&self, item: &MediaItem, reason: String) -> (ItemStatus, String) {
        tracing::error!(media_id = item.id, reason = %reason, "failed to generate alt text");
        self.notifier.notify(Notice::error(format!(
            "Failed to generate alt text for {}: {reason}",
            item.label()
        )));
        (ItemStatus::Failed, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut outcome = BatchOutcome::default();
        outcome.record(Some(1), ItemStatus::Succeeded, "a cat");
        outcome.record(Some(2), ItemStatus::Failed, "timeout");
        outcome.record(None, ItemStatus::Skipped, DETAIL_INVALID_REFERENCE);

        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.processed(), 3);
    }

    #[test]
    fn test_summary() {
        let mut outcome = BatchOutcome::default();
        outcome.record(Some(1), ItemStatus::Succeeded, "a cat");
        assert_eq!(
            outcome.summary(),
            "Processed 1 items: 1 succeeded, 0 failed, 0 skipped"
        );

        outcome.cancelled = true;
        assert!(outcome.summary().ends_with("(cancelled)"));
    }
}
