//! auto-alt - Automatic alt text for image media
//!
//! This library provides:
//! - A sequential bulk processor that generates and stores alt text
//! - An OpenAI-compatible vision client as the default generator
//! - `SQLite` media storage and TOML/env settings
//! - Upload and bulk-action entry points with update permission checks
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        UploadHook  │  GenerateAltTextAction    │
//! └────────────────────┬─────────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────────┐
//! │            BulkAltTextProcessor               │
//! └──────┬────────────────┬────────────────┬─────┘
//!        │                │                │
//!  MediaRepository  AltTextGenerator    Notifier
//!   (SQLite)         (vision API)      (tracing)
//! ```

pub mod access;
pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod media;
pub mod notify;
pub mod processor;

pub use access::Account;
pub use actions::{GenerateAltTextAction, UploadHook};
pub use config::Settings;
pub use db::{DbConn, DbPool, MediaRepo, NewMedia};
pub use error::{Error, Result};
pub use generator::{AltTextGenerator, GenerationResult, OpenAiAltTextGenerator, RetryPolicy};
pub use media::{Bundle, ImageField, MediaId, MediaItem, MediaRepository};
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use processor::{BatchOutcome, BulkAltTextProcessor, ItemOutcome, ItemStatus};
