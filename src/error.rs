//! Error types for auto-alt

use thiserror::Error;

/// Result type alias for auto-alt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in auto-alt
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Write conflict or validation failure while saving a media item
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Alt text generation error
    #[error("generation error: {0}")]
    Generation(String),

    /// Image source could not be read
    #[error("image error: {0}")]
    Image(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML encoding error
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
