//! OpenAI-compatible chat-completions client for alt text

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::retry::{self, RetryPolicy};
use super::{AltTextGenerator, GenerationResult, clean_alt_text};
use crate::config::Settings;
use crate::media::ImageField;
use crate::{Error, Result};

/// Vision model client that turns images into alt text
pub struct OpenAiAltTextGenerator {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    prompt: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl OpenAiAltTextGenerator {
    /// Create a generator from settings
    ///
    /// # Errors
    ///
    /// Returns error if the settings are incomplete or the HTTP client cannot be built
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("api_key is required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.api_endpoint.trim().to_string(),
            api_key,
            model: settings.model.clone(),
            prompt: settings.prompt.clone(),
            max_tokens: settings.max_tokens,
            retry: RetryPolicy::with_max_retries(settings.max_retries),
        })
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Describe an image, returning cleaned alt text
    ///
    /// # Errors
    ///
    /// Returns error if the image cannot be read, the API call fails after
    /// retries, or the model returns no text
    pub async fn describe(&self, image: &ImageField) -> Result<String> {
        let image_url = image_url_for(&image.uri).await?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: &self.prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ],
            }],
            max_tokens: Some(self.max_tokens),
        };

        let response = self.send_with_retry(&request).await?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let text = clean_alt_text(&raw)
            .ok_or_else(|| Error::Generation("empty response from model".to_string()))?;

        tracing::debug!(target_id = %image.target_id, alt = %text, "image described");
        Ok(text)
    }

    async fn send_with_retry(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse> {
        let mut attempt = 0;

        loop {
            let sent = self
                .client
                .post(&self.endpoint)
                .bearer_auth(self.api_key.expose_secret())
                .json(request)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) if retry::is_recoverable_error(&e) && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay(attempt, None);
                    tracing::warn!(error = %e, attempt, ?delay, "vision request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Generation(format!(
                        "request timed out after {} attempt(s): {e}",
                        attempt + 1
                    )));
                }
                Err(e) => return Err(Error::Generation(format!("request failed: {e}"))),
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json()
                    .await
                    .map_err(|e| Error::Generation(format!("invalid response: {e}")));
            }

            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(retry::parse_retry_after);
            let body = response.text().await.unwrap_or_default();

            if retry::is_recoverable_status(status.as_u16()) && self.retry.allows_retry(attempt) {
                let delay = self.retry.delay(attempt, retry_after);
                tracing::warn!(%status, attempt, ?delay, "vision API error, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(Error::Generation(format!(
                "API error {status}: {}",
                api_error_message(&body)
            )));
        }
    }
}

#[async_trait]
impl AltTextGenerator for OpenAiAltTextGenerator {
    async fn generate(&self, image: &ImageField) -> GenerationResult {
        match self.describe(image).await {
            Ok(text) => GenerationResult::Success(text),
            Err(e) => {
                tracing::warn!(target_id = %image.target_id, error = %e, "alt text generation failed");
                GenerationResult::Failure(e.to_string())
            }
        }
    }
}

/// Build the `image_url` value for a file URI
///
/// Remote and data URLs pass through; local files are inlined as base64.
async fn image_url_for(uri: &str) -> Result<String> {
    let uri = uri.trim();
    if uri.starts_with("http://") || uri.starts_with("https://") || uri.starts_with("data:") {
        return Ok(uri.to_string());
    }

    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Image(format!("cannot read {}: {e}", path.display())))?;

    if data.is_empty() {
        return Err(Error::Image(format!("{} is empty", path.display())));
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
    Ok(format!("data:{};base64,{encoded}", mime_type_for(path)))
}

/// MIME type from the file extension; unknown types default to jpeg
fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}
