//! Settings management for auto-alt
//!
//! Layering: built-in defaults, then the TOML settings file, then environment
//! variables.

pub mod file;

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

use file::{AutoAltConfigFile, GenerationFileConfig, StorageFileConfig};

/// Default chat-completions endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default vision model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default instruction sent alongside each image
pub const DEFAULT_PROMPT: &str = "Write alt text for this image for a visually impaired reader. \
     Use one or two plain sentences, describe the main subject and any visible text, \
     and do not start with \"Image of\" or \"Picture of\".";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_TOKENS: u32 = 300;

/// Keys accepted by [`Settings::set`]
pub const SETTING_KEYS: &[&str] = &[
    "api_key",
    "api_endpoint",
    "model",
    "generate_on_upload",
    "request_timeout_secs",
    "max_retries",
    "max_tokens",
    "prompt",
    "database_path",
];

/// auto-alt settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Vision API key (never logged)
    pub api_key: Option<SecretString>,

    /// Chat-completions endpoint URL
    pub api_endpoint: String,

    /// Model identifier
    pub model: String,

    /// Generate alt text when an image is uploaded
    pub generate_on_upload: bool,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries on rate limits and server errors
    pub max_retries: u32,

    /// Completion token cap
    pub max_tokens: u32,

    /// Instruction sent alongside the image
    pub prompt: String,

    /// Path to the media database
    pub database_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generate_on_upload: false,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt: DEFAULT_PROMPT.to_string(),
            database_path: file::data_dir().join("auto-alt.db"),
        }
    }
}

impl Settings {
    /// Load settings from the standard file path and the environment
    ///
    /// # Errors
    ///
    /// Returns error if an environment override cannot be parsed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_file_config(fc).with_env()
    }

    /// Load settings from an explicit file path and the environment
    ///
    /// # Errors
    ///
    /// Returns error if an environment override cannot be parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let fc = file::load_config_file_from(path);
        Self::from_file_config(fc).with_env()
    }

    /// Build settings from a parsed file, filling gaps with defaults
    ///
    /// Blank strings in the file count as unset.
    #[must_use]
    pub fn from_file_config(fc: AutoAltConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_key: non_empty(fc.api_key).map(SecretString::from),
            api_endpoint: non_empty(fc.api_endpoint).unwrap_or(defaults.api_endpoint),
            model: non_empty(fc.model).unwrap_or(defaults.model),
            generate_on_upload: fc.generate_on_upload.unwrap_or(defaults.generate_on_upload),
            request_timeout_secs: fc
                .generation
                .timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            max_retries: fc.generation.max_retries.unwrap_or(defaults.max_retries),
            max_tokens: fc.generation.max_tokens.unwrap_or(defaults.max_tokens),
            prompt: non_empty(fc.generation.prompt).unwrap_or(defaults.prompt),
            database_path: non_empty(fc.storage.database)
                .map_or(defaults.database_path, PathBuf::from),
        }
    }

    /// Apply environment variable overrides
    fn with_env(mut self) -> Result<Self> {
        if let Some(key) = env_var("AUTO_ALT_API_KEY").or_else(|| env_var("OPENAI_API_KEY")) {
            self.api_key = Some(SecretString::from(key));
        }
        if let Some(endpoint) = env_var("AUTO_ALT_API_ENDPOINT") {
            self.api_endpoint = endpoint;
        }
        if let Some(model) = env_var("AUTO_ALT_MODEL") {
            self.model = model;
        }
        if let Some(flag) = env_var("AUTO_ALT_GENERATE_ON_UPLOAD") {
            self.generate_on_upload = parse_bool(&flag)?;
        }
        if let Some(path) = env_var("AUTO_ALT_DATABASE") {
            self.database_path = PathBuf::from(path);
        }

        Ok(self)
    }

    /// Check the fields the settings form marks as required
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self
            .api_key
            .as_ref()
            .is_none_or(|k| k.expose_secret().trim().is_empty())
        {
            return Err(Error::Config(
                "api_key is required (set AUTO_ALT_API_KEY or `auto-alt config set api_key`)"
                    .to_string(),
            ));
        }

        let endpoint = self.api_endpoint.trim();
        if endpoint.is_empty() {
            return Err(Error::Config("api_endpoint is required".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_endpoint must be an http(s) URL, got {endpoint}"
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::Config("model is required".to_string()));
        }

        Ok(())
    }

    /// Set a single setting from its string form
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown key or an unparsable value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_key" => self.api_key = Some(SecretString::from(value.to_string())),
            "api_endpoint" => value.clone_into(&mut self.api_endpoint),
            "model" => value.clone_into(&mut self.model),
            "generate_on_upload" => self.generate_on_upload = parse_bool(value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            "max_retries" => self.max_retries = parse_number(key, value)?,
            "max_tokens" => self.max_tokens = parse_number(key, value)?,
            "prompt" => value.clone_into(&mut self.prompt),
            "database_path" => self.database_path = PathBuf::from(value),
            _ => {
                return Err(Error::Config(format!(
                    "unknown setting {key} (expected one of: {})",
                    SETTING_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Write the settings back to a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let fc = AutoAltConfigFile {
            api_key: self
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string()),
            api_endpoint: Some(self.api_endpoint.clone()),
            model: Some(self.model.clone()),
            generate_on_upload: Some(self.generate_on_upload),
            generation: GenerationFileConfig {
                timeout_secs: Some(self.request_timeout_secs),
                max_retries: Some(self.max_retries),
                max_tokens: Some(self.max_tokens),
                prompt: Some(self.prompt.clone()),
            },
            storage: StorageFileConfig {
                database: Some(self.database_path.display().to_string()),
            },
        };

        file::write_config_file(path, &fc)
    }

    /// API key with all but the last four characters hidden, for display
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let Some(key) = &self.api_key else {
            return "(not set)".to_string();
        };

        let key = key.expose_secret();
        let visible: String = key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        if key.chars().count() <= 4 {
            "****".to_string()
        } else {
            format!("****{visible}")
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("expected a boolean, got {other}"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            api_key: Some(SecretString::from("sk-test-1234")),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_file_config(AutoAltConfigFile::default());
        assert_eq!(settings.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(settings.model, "gpt-4o");
        assert!(!settings.generate_on_upload);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn test_blank_file_values_fall_back() {
        let fc = AutoAltConfigFile {
            api_endpoint: Some("  ".to_string()),
            model: Some(String::new()),
            ..Default::default()
        };

        let settings = Settings::from_file_config(fc);
        assert_eq!(settings.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("api_key"));
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let mut settings = valid_settings();
        settings.api_endpoint = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());

        settings.api_endpoint = "http://localhost:8080/v1/chat/completions".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_model() {
        let mut settings = valid_settings();
        settings.model = " ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_set_known_keys() {
        let mut settings = Settings::default();
        settings.set("model", "gpt-4o-mini").unwrap();
        settings.set("generate_on_upload", "yes").unwrap();
        settings.set("max_retries", "0").unwrap();

        assert_eq!(settings.model, "gpt-4o-mini");
        assert!(settings.generate_on_upload);
        assert_eq!(settings.max_retries, 0);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(settings.set("colour", "blue").is_err());
        assert!(settings.set("generate_on_upload", "maybe").is_err());
        assert!(settings.set("max_tokens", "-1").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = valid_settings();
        settings.generate_on_upload = true;
        settings.model = "gpt-4o-mini".to_string();
        settings.save(&path).unwrap();

        let reloaded = Settings::from_file_config(file::load_config_file_from(&path));
        assert_eq!(reloaded.model, "gpt-4o-mini");
        assert!(reloaded.generate_on_upload);
        assert_eq!(
            reloaded.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-test-1234".to_string())
        );
    }

    #[test]
    fn test_masked_api_key() {
        assert_eq!(valid_settings().masked_api_key(), "****1234");
        assert_eq!(Settings::default().masked_api_key(), "(not set)");

        let short = Settings {
            api_key: Some(SecretString::from("abc")),
            ..Settings::default()
        };
        assert_eq!(short.masked_api_key(), "****");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", valid_settings());
        assert!(!rendered.contains("sk-test-1234"));
    }
}
