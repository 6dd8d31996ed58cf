/// LLM Client: the single point of entry for all AI provider calls in ResuMatch.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions MUST go through a `ProviderClient`.
///
/// One call is one outbound HTTP request. There is no retry loop here: retrying
/// is the caller's decision (the UI's "Try Again").
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::wire::{
    AnthropicMessage, AnthropicRequest, AnthropicResponse, ChatCompletionRequest,
    ChatCompletionResponse, ChatMessage, CohereRequest, CohereResponse, GeminiContent,
    GeminiPart, GeminiRequest, GeminiResponse, ResponseFormat,
};

pub mod prompts;
pub mod wire;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;
/// Transport-level backstop. The analysis controller applies its own, shorter timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned empty content")]
    EmptyContent,
}

// Gemini carries its key in the query string, so the URL is dropped before
// the error can be displayed or logged.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Http(e.without_url())
    }
}

/// AI providers the service knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    HuggingFace,
    Cohere,
    Anthropic,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::HuggingFace => "huggingface",
            ProviderId::Cohere => "cohere",
            ProviderId::Anthropic => "anthropic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "Google Gemini",
            ProviderId::HuggingFace => "Hugging Face",
            ProviderId::Cohere => "Cohere AI",
            ProviderId::Anthropic => "Anthropic Claude",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
            }
            ProviderId::HuggingFace => "https://router.huggingface.co/v1/chat/completions",
            ProviderId::Cohere => "https://api.cohere.com/v1/chat",
            ProviderId::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    /// Model name sent in the request body. Gemini encodes the model in the URL.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini-1.5-flash",
            ProviderId::HuggingFace => "meta-llama/Llama-3.2-3B-Instruct",
            ProviderId::Cohere => "command-r-08-2024",
            ProviderId::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown AI provider '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "huggingface" => Ok(ProviderId::HuggingFace),
            "cohere" => Ok(ProviderId::Cohere),
            "anthropic" => Ok(ProviderId::Anthropic),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// A resolved credential: which provider, where to reach it, and the key to use.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: ProviderId,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

impl Credential {
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            endpoint: provider.default_endpoint().to_string(),
            model: provider.default_model().to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// Keys never reach the logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// Sends a prompt to an AI provider and returns the model's raw text output.
///
/// Carried in `AppState` as `Arc<dyn ProviderClient>` so tests can swap in stubs.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn send(&self, prompt: &str, credential: &Credential) -> Result<String, ProviderError>;
}

/// reqwest-backed client speaking the Gemini, Cohere, Hugging Face and Anthropic wire formats.
#[derive(Clone)]
pub struct HttpProviderClient {
    client: Client,
}

impl HttpProviderClient {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("resumatch/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn send_gemini(&self, prompt: &str, credential: &Credential) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };
        let request = self
            .client
            .post(&credential.endpoint)
            .query(&[("key", credential.api_key.as_str())])
            .json(&body);
        let response: GeminiResponse = execute(request).await?;
        Ok(response.text())
    }

    async fn send_cohere(&self, prompt: &str, credential: &Credential) -> Result<String, ProviderError> {
        let body = CohereRequest {
            message: prompt,
            model: &credential.model,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let request = self
            .client
            .post(&credential.endpoint)
            .bearer_auth(&credential.api_key)
            .json(&body);
        let response: CohereResponse = execute(request).await?;
        Ok(response.text)
    }

    async fn send_hugging_face(
        &self,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &credential.model,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(&credential.endpoint)
            .bearer_auth(&credential.api_key)
            .json(&body);
        let response: ChatCompletionResponse = execute(request).await?;
        Ok(response.text())
    }

    async fn send_anthropic(
        &self,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ProviderError> {
        let body = AnthropicRequest {
            model: &credential.model,
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(&credential.endpoint)
            .header("x-api-key", &credential.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: AnthropicResponse = execute(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }
        Ok(response.text())
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn send(&self, prompt: &str, credential: &Credential) -> Result<String, ProviderError> {
        debug!(
            provider = %credential.provider,
            prompt_chars = prompt.len(),
            "sending analysis prompt"
        );

        let text = match credential.provider {
            ProviderId::Gemini => self.send_gemini(prompt, credential).await?,
            ProviderId::Cohere => self.send_cohere(prompt, credential).await?,
            ProviderId::HuggingFace => self.send_hugging_face(prompt, credential).await?,
            ProviderId::Anthropic => self.send_anthropic(prompt, credential).await?,
        };

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyContent);
        }
        Ok(text)
    }
}

/// Sends the request and decodes a 2xx body as `T`. Anything else becomes a `ProviderError`.
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body).unwrap_or(body);
        warn!("provider API returned {}: {}", status, message);
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

/// Pulls a readable message out of the error bodies the supported providers return:
/// `{"error": {"message": ..}}`, `{"error": ".."}` or `{"message": ..}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error");
    error
        .and_then(|e| e.get("message"))
        .or_else(|| error.filter(|e| e.is_string()))
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
}
