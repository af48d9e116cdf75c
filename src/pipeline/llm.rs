//! Model interaction: one chat-completion call per generation.
//!
//! The pipeline talks to the model through the [`GenerationBackend`] trait so
//! the HTTP layer and tests can swap in any implementation. Two ship with the
//! crate:
//!
//! * [`MistralBackend`]: direct HTTP client for Mistral-compatible chat
//!   completion APIs, using native JSON-object response mode.
//! * [`ProviderBackend`]: adapter over any edgequake-llm provider (OpenAI,
//!   Anthropic, Gemini, Ollama, …). The JSON shape is enforced by the prompt
//!   alone.
//!
//! There is no retry: a generation is a single attempt and every failure is
//! returned to the caller as-is.

use crate::config::GenerationConfig;
use crate::error::FlashGenError;
use crate::output::TokenUsage;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Fixed sampling parameters for a generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout: Option<Duration>,
}

impl SamplingParams {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Raw model output before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// A language model able to answer one system + user prompt pair.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Send one request. Implementations must not retry.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Completion, FlashGenError>;
}

// ── Mistral ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Client for Mistral-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct MistralBackend {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl MistralBackend {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build from config, reading `MISTRAL_API_KEY` when no key is set.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, FlashGenError> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var("MISTRAL_API_KEY").unwrap_or_default(),
        };
        if api_key.trim().is_empty() {
            return Err(FlashGenError::ProviderNotConfigured {
                provider: "mistral".to_string(),
                hint: "Set MISTRAL_API_KEY or pass --api-key.".to_string(),
            });
        }
        Ok(Self::new(&config.api_base, api_key, &config.model))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl GenerationBackend for MistralBackend {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Completion, FlashGenError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system,
                },
                WireMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        info!("Calling {} at {}", self.model, self.endpoint());
        let start = Instant::now();

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request);
        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Mistral request failed: {}", e);
            FlashGenError::Transport {
                message: e.to_string(),
                status: None,
                body: None,
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| FlashGenError::Transport {
            message: format!("failed to read response body: {e}"),
            status: Some(status.as_u16()),
            body: None,
        })?;

        if !status.is_success() {
            let body: Value =
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()));
            error!("Mistral API error: status {}, body {}", status, body);
            return Err(classify_api_error(status.as_u16(), body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| FlashGenError::Transport {
                message: format!("unexpected response envelope: {e}"),
                status: Some(status.as_u16()),
                body: None,
            })?;

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(FlashGenError::EmptyResponse)?;

        debug!(
            "Mistral answered in {:?}: {} chars, usage {:?}",
            start.elapsed(),
            content.len(),
            usage
        );

        Ok(Completion { content, usage })
    }
}

/// Map a non-success API status onto the error taxonomy.
///
/// A 400, or any body complaining that the input is too large, means the
/// prompt overflowed the model's context window.
fn classify_api_error(status: u16, body: Value) -> FlashGenError {
    let mentions_size = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.as_str())
        .is_some_and(|m| m.contains("too large for model"));

    if status == 400 || mentions_size {
        FlashGenError::ModelContextExceeded { body: Some(body) }
    } else {
        FlashGenError::Transport {
            message: format!("HTTP {status}"),
            status: Some(status),
            body: Some(body),
        }
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Adapter that drives any edgequake-llm [`LLMProvider`].
#[derive(Clone)]
pub struct ProviderBackend {
    name: String,
    provider: Arc<dyn LLMProvider>,
}

impl ProviderBackend {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

#[async_trait]
impl GenerationBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Completion, FlashGenError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        let options = build_options(params);

        let call = self.provider.chat(&messages, Some(&options));
        let result = match params.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                FlashGenError::Transport {
                    message: format!("timed out after {}s", timeout.as_secs()),
                    status: None,
                    body: None,
                }
            })?,
            None => call.await,
        };

        let response = result.map_err(|e| {
            error!("Provider '{}' call failed: {}", self.name, e);
            FlashGenError::Transport {
                message: e.to_string(),
                status: None,
                body: None,
            }
        })?;

        if response.content.trim().is_empty() {
            return Err(FlashGenError::EmptyResponse);
        }

        debug!(
            "Provider '{}': {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );

        Ok(Completion {
            content: response.content,
            usage: Some(TokenUsage {
                prompt_tokens: response.prompt_tokens as usize,
                completion_tokens: response.completion_tokens as usize,
            }),
        })
    }
}

/// Build `CompletionOptions` from the sampling parameters.
fn build_options(params: &SamplingParams) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(params.temperature),
        max_tokens: Some(params.max_tokens),
        ..Default::default()
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Resolve the generation backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`): used as-is.
/// 2. **`mistral`**: the native JSON-mode client; needs `MISTRAL_API_KEY`.
/// 3. **`auto`**: `ProviderFactory::from_env` picks the first provider
///    whose API key is present.
/// 4. **Any other name**: `ProviderFactory::create_llm_provider` with the
///    configured model.
pub fn resolve_backend(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationBackend>, FlashGenError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    match config.provider_name.as_str() {
        "mistral" => Ok(Arc::new(MistralBackend::from_config(config)?)),
        "auto" => {
            let (provider, _embedding) =
                ProviderFactory::from_env().map_err(|e| FlashGenError::ProviderNotConfigured {
                    provider: "auto".to_string(),
                    hint: format!(
                        "No LLM provider could be auto-detected from environment.\n\
                        Set MISTRAL_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY.\n\
                        Error: {}",
                        e
                    ),
                })?;
            Ok(Arc::new(ProviderBackend::new("auto", provider)))
        }
        name => {
            let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(
                |e| FlashGenError::ProviderNotConfigured {
                    provider: name.to_string(),
                    hint: format!("{e}"),
                },
            )?;
            Ok(Arc::new(ProviderBackend::new(name, provider)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_options_from_defaults() {
        let params = SamplingParams::from_config(&GenerationConfig::default());
        let opts = build_options(&params);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(24_000));
        assert!(params.timeout.is_none());
    }

    #[test]
    fn request_uses_json_object_mode() {
        let req = ChatRequest {
            model: "mistral-large-latest",
            messages: vec![WireMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.1,
            max_tokens: 10,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["response_format"]["type"], "json_object");
        assert_eq!(v["messages"][0]["role"], "user");
    }

    #[test]
    fn status_400_is_context_exceeded() {
        let err = classify_api_error(400, json!({ "message": "bad request" }));
        assert!(matches!(err, FlashGenError::ModelContextExceeded { .. }));
    }

    #[test]
    fn size_message_is_context_exceeded() {
        let err = classify_api_error(422, json!({ "message": "Prompt too large for model" }));
        assert!(matches!(err, FlashGenError::ModelContextExceeded { .. }));
    }

    #[test]
    fn other_statuses_are_transport() {
        let err = classify_api_error(503, json!("overloaded"));
        match err {
            FlashGenError::Transport { status, body, .. } => {
                assert_eq!(status, Some(503));
                assert_eq!(body, Some(json!("overloaded")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mistral_requires_api_key() {
        let config = GenerationConfig::builder().api_key("  ").build().unwrap();
        let err = MistralBackend::from_config(&config).unwrap_err();
        assert!(matches!(err, FlashGenError::ProviderNotConfigured { .. }));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let backend = MistralBackend::new("http://localhost:9999/v1/", "k", "m");
        assert_eq!(backend.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn prebuilt_backend_wins() {
        let backend: Arc<dyn GenerationBackend> =
            Arc::new(MistralBackend::new("http://localhost", "k", "m"));
        let config = GenerationConfig::builder()
            .provider_name("definitely-not-a-provider")
            .backend(Arc::clone(&backend))
            .build()
            .unwrap();
        let resolved = resolve_backend(&config).unwrap();
        assert_eq!(resolved.name(), "mistral");
    }
}
