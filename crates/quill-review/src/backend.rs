//! Generation backends that turn a diff into review text.
//!
//! Two implementations share the [`ReviewBackend`] trait:
//! - [`GeminiBackend`]: `POST {endpoint}/{model}:generateContent?key=...`
//! - [`OllamaBackend`]: `POST {address}/api/generate` with `stream=false`
//!
//! A response that lacks the expected text field yields [`NO_FEEDBACK`]
//! rather than an error.

use async_trait::async_trait;
use quill_core::{BackendKind, BotConfig, GeminiConfig, OllamaConfig, QuillError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::prompt;

/// Review text used when the backend answers without any text.
pub const NO_FEEDBACK: &str = "No feedback generated.";

/// A text-generation service that reviews a diff.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Which backend this is; selects the comment heading.
    fn kind(&self) -> BackendKind;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate free-text review feedback for `diff`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Backend`] on transport errors, non-2xx
    /// statuses, or a body that is not JSON.
    async fn generate_review(&self, diff: &str) -> Result<String, QuillError>;
}

/// Build the backend selected in `config`.
///
/// # Errors
///
/// Returns [`QuillError::Config`] if the selected backend is missing a
/// required setting.
pub fn build_backend(config: &BotConfig) -> Result<Box<dyn ReviewBackend>, QuillError> {
    match config.backend {
        BackendKind::Gemini => Ok(Box::new(GeminiBackend::new(&config.gemini)?)),
        BackendKind::Ollama => Ok(Box::new(OllamaBackend::new(&config.ollama))),
    }
}

/// Google Gemini `generateContent` client.
///
/// # Examples
///
/// ```
/// use quill_core::GeminiConfig;
/// use quill_review::backend::GeminiBackend;
///
/// let config = GeminiConfig {
///     api_key: Some("test-key".into()),
///     ..GeminiConfig::default()
/// };
/// let backend = GeminiBackend::new(&config).unwrap();
/// assert!(backend.url().ends_with("/gemini-1.5-flash:generateContent"));
/// ```
pub struct GeminiBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if no API key is configured.
    pub fn new(config: &GeminiConfig) -> Result<Self, QuillError> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client that sends requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if no API key is configured.
    pub fn with_client(config: &GeminiConfig, client: reqwest::Client) -> Result<Self, QuillError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            QuillError::Config("GEMINI_API_KEY is required for the gemini backend".into())
        })?;
        let url = format!(
            "{}/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            client,
            url,
            api_key,
            model: config.model.clone(),
        })
    }

    /// Full `generateContent` URL, without the key parameter.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the review prompt for `diff` and return the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Backend`] on transport errors, non-2xx statuses,
    /// or a body that is not JSON.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn generate(&self, diff: &str) -> Result<String, QuillError> {
        let prompt = prompt::build_review_prompt(diff);
        let body = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: &prompt }],
            }],
        };

        debug!("POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| QuillError::backend(self.name(), format!("request failed: {e}")))?;

        let json = read_json(self.name(), response).await?;
        Ok(extract_gemini_text(&json))
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[async_trait]
impl ReviewBackend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn name(&self) -> &str {
        "Gemini API"
    }

    async fn generate_review(&self, diff: &str) -> Result<String, QuillError> {
        self.generate(diff).await
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a Gemini response.
///
/// # Examples
///
/// ```
/// use quill_review::backend::{extract_gemini_text, NO_FEEDBACK};
///
/// let body = serde_json::json!({
///     "candidates": [{ "content": { "parts": [{ "text": "Looks good." }] } }]
/// });
/// assert_eq!(extract_gemini_text(&body), "Looks good.");
/// assert_eq!(extract_gemini_text(&serde_json::json!({})), NO_FEEDBACK);
/// ```
pub fn extract_gemini_text(body: &Value) -> String {
    text_or_placeholder(
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str),
    )
}

/// Client for a model served through the Ollama API.
///
/// # Examples
///
/// ```
/// use quill_core::OllamaConfig;
/// use quill_review::backend::OllamaBackend;
///
/// let config = OllamaConfig {
///     address: "http://gpu-box:11434/".into(),
///     ..OllamaConfig::default()
/// };
/// let backend = OllamaBackend::new(&config);
/// assert_eq!(backend.url(), "http://gpu-box:11434/api/generate");
/// assert_eq!(backend.model(), "codellama");
/// ```
pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a client from configuration.
    pub fn new(config: &OllamaConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client that sends requests through `client`.
    pub fn with_client(config: &OllamaConfig, client: reqwest::Client) -> Self {
        let base = config.address.trim().trim_end_matches('/');
        Self {
            client,
            url: format!("{base}/api/generate"),
            model: config.model.clone(),
        }
    }

    /// Full `/api/generate` URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a non-streaming `/api/generate` request for `diff`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Backend`] on transport errors, non-2xx statuses,
    /// or a body that is not JSON.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn generate(&self, diff: &str) -> Result<String, QuillError> {
        let prompt = prompt::build_review_prompt(diff);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        debug!("POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuillError::backend(self.name(), format!("request failed: {e}")))?;

        let json = read_json(self.name(), response).await?;
        Ok(extract_ollama_text(&json))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[async_trait]
impl ReviewBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate_review(&self, diff: &str) -> Result<String, QuillError> {
        self.generate(diff).await
    }
}

/// Pull the `response` field out of an Ollama `/api/generate` reply.
///
/// # Examples
///
/// ```
/// use quill_review::backend::{extract_ollama_text, NO_FEEDBACK};
///
/// let body = serde_json::json!({ "model": "codellama", "response": "Rename x." });
/// assert_eq!(extract_ollama_text(&body), "Rename x.");
/// assert_eq!(extract_ollama_text(&serde_json::json!({ "response": "" })), NO_FEEDBACK);
/// ```
pub fn extract_ollama_text(body: &Value) -> String {
    text_or_placeholder(body.get("response").and_then(Value::as_str))
}

fn text_or_placeholder(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => NO_FEEDBACK.to_string(),
    }
}

async fn read_json(backend: &str, response: reqwest::Response) -> Result<Value, QuillError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(240).collect();
        return Err(QuillError::backend(
            backend,
            format!("API error {status}: {snippet}"),
        ));
    }

    let text = response
        .text()
        .await
        .map_err(|e| QuillError::backend(backend, format!("failed to read response: {e}")))?;
    serde_json::from_str(&text)
        .map_err(|e| QuillError::backend(backend, format!("failed to parse response: {e}")))
}
