//! TOML settings file loading and saving
//!
//! Supports `~/.config/auto-alt/config.toml` as a persistent settings source.
//! All fields are optional: the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML settings file schema
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AutoAltConfigFile {
    /// Vision API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Chat-completions endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,

    /// Model identifier (e.g. "gpt-4o")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generate alt text when an image is uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_on_upload: Option<bool>,

    /// Request tuning
    #[serde(default)]
    pub generation: GenerationFileConfig,

    /// Storage location
    #[serde(default)]
    pub storage: StorageFileConfig,
}

/// Generation request configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationFileConfig {
    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Retries on rate limits and server errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Completion token cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Instruction sent alongside the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Storage configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageFileConfig {
    /// Path to the media database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Load the TOML settings file from the standard path
///
/// Returns `AutoAltConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AutoAltConfigFile {
    config_file_path().map_or_else(AutoAltConfigFile::default, |p| load_config_file_from(&p))
}

/// Load the TOML settings file from an explicit path
///
/// Returns `AutoAltConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> AutoAltConfigFile {
    if !path.exists() {
        return AutoAltConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AutoAltConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AutoAltConfigFile::default()
        }
    }
}

/// Write the settings file, creating parent directories as needed
///
/// # Errors
///
/// Returns error if the file cannot be encoded or written
pub fn write_config_file(path: &Path, config: &AutoAltConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;

    tracing::info!(path = %path.display(), "saved config file");
    Ok(())
}

/// Return the settings file path: `~/.config/auto-alt/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("auto-alt").join("config.toml"))
}

/// Return the data directory: `~/.local/share/auto-alt`
pub fn data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".auto-alt"),
        |d| d.data_dir().join("auto-alt"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_file_from(&dir.path().join("absent.toml"));
        assert!(config.api_key.is_none());
        assert!(config.generation.max_retries.is_none());
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [unterminated").unwrap();

        let config = load_config_file_from(&path);
        assert!(config.model.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "model = \"gpt-4o-mini\"\ngenerate_on_upload = true\n\n[generation]\nmax_retries = 5\n",
        )
        .unwrap();

        let config = load_config_file_from(&path);
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.generate_on_upload, Some(true));
        assert_eq!(config.generation.max_retries, Some(5));
        assert!(config.api_endpoint.is_none());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AutoAltConfigFile {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        write_config_file(&path, &config).unwrap();

        let loaded = load_config_file_from(&path);
        assert_eq!(loaded.api_key.as_deref(), Some("sk-test"));
    }
}
