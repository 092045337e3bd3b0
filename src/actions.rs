//! Entry points that start alt text batches
//!
//! [`GenerateAltTextAction`] is the administrative bulk action over a
//! selection of media ids. [`UploadHook`] runs a one-item batch for a newly
//! stored image when generation on upload is enabled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::access::Account;
use crate::db::MediaRepo;
use crate::media::{MediaId, MediaItem};
use crate::notify::{Notice, Notifier};
use crate::processor::{BatchOutcome, BulkAltTextProcessor};

/// Bulk action: generate alt text for selected images
pub struct GenerateAltTextAction {
    repo: MediaRepo,
    processor: Arc<BulkAltTextProcessor>,
    notifier: Arc<dyn Notifier>,
}

impl GenerateAltTextAction {
    #[must_use]
    pub fn new(
        repo: MediaRepo,
        processor: Arc<BulkAltTextProcessor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repo,
            processor,
            notifier,
        }
    }

    /// Run the action for a single media item
    ///
    /// # Errors
    ///
    /// Returns error if the item cannot be loaded
    pub async fn execute(&self, account: &Account, id: MediaId) -> Result<BatchOutcome> {
        self.execute_multiple(account, &[id], &CancellationToken::new())
            .await
    }

    /// Run the action for a selection of media items
    ///
    /// Unknown ids stay in the batch as invalid references. Items the
    /// account may not update are left out of the batch entirely.
    ///
    /// # Errors
    ///
    /// Returns error if the items cannot be loaded
    pub async fn execute_multiple(
        &self,
        account: &Account,
        ids: &[MediaId],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let resolved = self.repo.resolve(ids)?;

        let mut batch = Vec::with_capacity(resolved.len());
        for item in resolved {
            match item {
                Some(item) if !account.can_update(&item) => {
                    tracing::warn!(media_id = item.id, account = %account.id, "update access denied");
                    self.notifier.notify(Notice::warning(format!(
                        "You are not allowed to update {}.",
                        item.label()
                    )));
                }
                other => batch.push(other),
            }
        }

        tracing::info!(
            selected = ids.len(),
            batch = batch.len(),
            account = %account.id,
            "executing alt text bulk action"
        );

        Ok(self.processor.process_batch_with_cancel(batch, cancel).await)
    }
}

/// Upload hook: generate alt text for new images
pub struct UploadHook {
    enabled: bool,
    processor: Arc<BulkAltTextProcessor>,
}

impl UploadHook {
    #[must_use]
    pub fn new(enabled: bool, processor: Arc<BulkAltTextProcessor>) -> Self {
        Self { enabled, processor }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Handle a newly inserted media item
    ///
    /// Returns `None` when nothing ran because the hook is disabled or the
    /// item is not an image. Alt text supplied by the uploader is replaced.
    pub async fn on_insert(&self, item: MediaItem) -> Option<BatchOutcome> {
        if !self.enabled {
            return None;
        }

        if !item.is_image() {
            tracing::debug!(media_id = item.id, bundle = %item.bundle, "upload is not an image");
            return None;
        }

        Some(self.processor.process_batch(vec![Some(item)]).await)
    }
}
