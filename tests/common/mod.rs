//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auto_alt::{
    AltTextGenerator, Bundle, CollectingNotifier, DbPool, Error, GenerationResult, ImageField,
    MediaItem, MediaRepository, NewMedia, db,
};
use tokio_util::sync::CancellationToken;

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Build an image media item
pub fn image_item(id: i64) -> MediaItem {
    MediaItem {
        id,
        bundle: Bundle::Image,
        name: format!("Photo {id}"),
        owner_id: "editor".to_string(),
        image: Some(ImageField {
            target_id: format!("file-{id}"),
            uri: format!("/srv/files/photo-{id}.jpg"),
            alt: None,
        }),
    }
}

/// Build a document media item
pub fn document_item(id: i64) -> MediaItem {
    MediaItem {
        id,
        bundle: Bundle::Document,
        name: format!("Document {id}"),
        owner_id: "editor".to_string(),
        image: None,
    }
}

/// Fields for storing an image through `MediaRepo::create`
pub fn new_image(name: &str, owner: &str) -> NewMedia {
    NewMedia {
        bundle: Bundle::Image,
        name: name.to_string(),
        owner_id: owner.to_string(),
        image: Some(ImageField {
            target_id: format!("file-{name}"),
            uri: format!("/srv/files/{name}.jpg"),
            alt: None,
        }),
    }
}

/// Generator that replays a fixed pattern of results
pub struct StubGenerator {
    pattern: Vec<GenerationResult>,
    calls: Mutex<Vec<String>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl StubGenerator {
    /// Always succeed with the given text
    pub fn always(text: &str) -> Self {
        Self::pattern(vec![GenerationResult::Success(text.to_string())])
    }

    /// Cycle through the given results
    pub fn pattern(pattern: Vec<GenerationResult>) -> Self {
        Self {
            pattern,
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Cancel `token` once `calls` generations have happened
    pub fn cancelling_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    /// Target ids passed to `generate`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AltTextGenerator for StubGenerator {
    async fn generate(&self, image: &ImageField) -> GenerationResult {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(image.target_id.clone());
            calls.len()
        };

        if let Some((after, token)) = &self.cancel_after {
            if count >= *after {
                token.cancel();
            }
        }

        self.pattern[(count - 1) % self.pattern.len()].clone()
    }
}

/// Repository that records saves, optionally failing some of them
#[derive(Default)]
pub struct RecordingRepository {
    saved: Mutex<Vec<MediaItem>>,
    failures: Mutex<VecDeque<Option<String>>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue per-save results: `Some(reason)` fails that save, `None` lets it through
    pub fn with_save_results(results: Vec<Option<&str>>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            failures: Mutex::new(
                results
                    .into_iter()
                    .map(|r| r.map(ToString::to_string))
                    .collect(),
            ),
        }
    }

    pub fn saved(&self) -> Vec<MediaItem> {
        self.saved.lock().unwrap().clone()
    }
}

impl MediaRepository for RecordingRepository {
    fn save(&self, item: &MediaItem) -> auto_alt::Result<()> {
        if let Some(Some(reason)) = self.failures.lock().unwrap().pop_front() {
            return Err(Error::Persistence(reason));
        }
        self.saved.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// Processor wired to the given stubs
pub fn processor(
    repo: &Arc<RecordingRepository>,
    generator: &Arc<StubGenerator>,
    notifier: &Arc<CollectingNotifier>,
) -> auto_alt::BulkAltTextProcessor {
    auto_alt::BulkAltTextProcessor::new(repo.clone(), generator.clone(), notifier.clone())
}
