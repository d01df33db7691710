//! Google Gemini provider implementation for relaychat
//!
//! This module implements the [`Provider`] trait against the Gemini
//! `streamGenerateContent` endpoint, reading the server-sent events variant
//! of the API (`alt=sse`) and yielding candidate text as it arrives.

use crate::config::GeminiConfig;
use crate::error::{RelayError, Result};
use crate::providers::sse::sse_data_stream;
use crate::providers::{Message, Provider, Role, TextStream};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

/// Gemini API provider
///
/// # Examples
///
/// ```no_run
/// use relaychat::config::GeminiConfig;
/// use relaychat::providers::{GeminiProvider, Message, Provider};
/// use futures::StreamExt;
///
/// # async fn example() -> relaychat::error::Result<()> {
/// let config = GeminiConfig {
///     api_key: Some("secret".to_string()),
///     ..GeminiConfig::default()
/// };
/// let provider = GeminiProvider::new(config)?;
/// let mut stream = provider
///     .stream_chat("models/gemini-2.0-flash", &[Message::user("Hello!")])
///     .await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: String,
}

/// Request body for `streamGenerateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
}

/// System instruction block
#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

/// A single turn in Gemini format
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Content part; only text parts are produced or consumed
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

/// One SSE payload of a streamed response
#[derive(Debug, Deserialize)]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// The API key comes from `config.api_key`, falling back to the
    /// `GOOGLE_GENERATIVE_AI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns error if no API key is available or the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RelayError::Config(format!(
                    "Gemini API key is not set; configure provider.gemini.api_key or {}",
                    API_KEY_ENV
                ))
            })?;

        // No request timeout is set.
        let client = Client::builder()
            .user_agent(concat!("relaychat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Gemini provider: api_base={}", config.api_base);

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Full streaming endpoint URL for a model identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::config::GeminiConfig;
    /// use relaychat::providers::GeminiProvider;
    ///
    /// let config = GeminiConfig {
    ///     api_key: Some("k".to_string()),
    ///     api_base: "https://example.test/v1beta".to_string(),
    ///     ..GeminiConfig::default()
    /// };
    /// let provider = GeminiProvider::new(config).unwrap();
    /// assert_eq!(
    ///     provider.stream_endpoint("gemini-2.0-flash"),
    ///     "https://example.test/v1beta/models/gemini-2.0-flash:streamGenerateContent"
    /// );
    /// ```
    pub fn stream_endpoint(&self, model: &str) -> String {
        format!("{}/{}:streamGenerateContent", self.api_base, model_path(model))
    }
}

/// Identifiers containing a `/` are used verbatim, others get the `models/` prefix
fn model_path(model: &str) -> String {
    if model.contains('/') {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Convert relaychat messages to a Gemini request
///
/// Leading system messages become the system instruction. A system message
/// after the conversation has started cannot be expressed and is rejected.
fn build_request(messages: &[Message]) -> Result<GeminiRequest> {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for (index, message) in messages.iter().enumerate() {
        let role = match message.role {
            Role::System => {
                if !contents.is_empty() {
                    return Err(RelayError::Provider(format!(
                        "system message at index {} is not at the beginning of the conversation",
                        index
                    ))
                    .into());
                }
                system_parts.push(GeminiPart {
                    text: Some(message.content.clone()),
                    thought: None,
                });
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };

        contents.push(GeminiContent {
            role: Some(role.to_string()),
            parts: vec![GeminiPart {
                text: Some(message.content.clone()),
                thought: None,
            }],
        });
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(GeminiSystemInstruction {
            parts: system_parts,
        })
    };

    Ok(GeminiRequest {
        contents,
        system_instruction,
    })
}

/// Extract the visible text of one streamed chunk
fn chunk_text(data: &str) -> Result<String> {
    let chunk: GeminiStreamChunk = serde_json::from_str(data)
        .map_err(|e| RelayError::Provider(format!("Failed to parse Gemini stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(RelayError::Provider(format!(
            "Gemini stream error (code {}): {}",
            error.code.map(|c| c.to_string()).unwrap_or_else(|| "?".into()),
            error.message
        ))
        .into());
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(String::new());
    };

    if let Some(reason) = &candidate.finish_reason {
        tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
    }

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| part.thought != Some(true))
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn stream_chat(&self, model: &str, messages: &[Message]) -> Result<TextStream> {
        let request = build_request(messages)?;
        let url = self.stream_endpoint(model);

        tracing::debug!(
            model,
            message_count = messages.len(),
            "Sending Gemini streaming request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::Provider(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::ProviderStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let fragments: TextStream = Box::pin(sse_data_stream(response.bytes_stream()).filter_map(
            |event| async move {
                match event.and_then(|data| chunk_text(&data)) {
                    Ok(text) if text.is_empty() => None,
                    other => Some(other),
                }
            },
        ));

        Ok(fragments)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
