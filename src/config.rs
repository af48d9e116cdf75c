//! Configuration types for study-package generation and the HTTP server.
//!
//! Generation behaviour is controlled through [`GenerationConfig`], built via
//! [`GenerationConfigBuilder`]; the server wraps it in [`ServerConfig`].
//! Callers set only what they care about and rely on the documented defaults
//! for the rest.

use crate::error::FlashGenError;
use crate::pipeline::llm::GenerationBackend;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model used by the Mistral backend.
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

/// Default Mistral API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.mistral.ai/v1";

/// Configuration for one generation call.
///
/// # Example
/// ```rust
/// use flashgen::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("mistral-small-latest")
///     .temperature(0.2)
///     .default_flashcard_count(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.default_flashcard_count, 10);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Backend name: `"mistral"` (default, native JSON mode), `"auto"`, or any
    /// provider known to edgequake-llm (`"openai"`, `"anthropic"`, …).
    pub provider_name: String,

    /// Model identifier. Default: `mistral-large-latest`.
    pub model: String,

    /// Base URL of the Mistral-compatible chat completions API.
    pub api_base: String,

    /// API key for the Mistral backend. Falls back to `MISTRAL_API_KEY`.
    pub api_key: Option<String>,

    /// Pre-constructed backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn GenerationBackend>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// The output must follow a strict JSON shape with exact counts, so the
    /// model is kept close to deterministic.
    pub temperature: f32,

    /// Output-token ceiling for the single model call. Default: 24 000.
    ///
    /// Twenty flashcards, fifteen QCM and a one-to-two page revision sheet
    /// routinely exceed 10 000 tokens; a low ceiling cuts the JSON mid-way
    /// and the response becomes unparseable.
    pub max_tokens: usize,

    /// Hard input limit in characters. Larger inputs are rejected. Default: 400 000.
    pub max_input_chars: usize,

    /// Character budget the source text is truncated to before prompting. Default: 100 000.
    pub truncate_budget_chars: usize,

    /// Flashcards requested when the caller gives no valid count. Default: 20.
    pub default_flashcard_count: usize,

    /// QCM questions requested when the caller gives no valid count. Default: 15.
    pub default_qcm_count: usize,

    /// Largest flashcard count a caller may request. Default: 100.
    pub max_flashcard_count: usize,

    /// Largest QCM count a caller may request. Default: 100.
    pub max_qcm_count: usize,

    /// Upper share of flashcards that receive an extracted image. Default: 0.3.
    pub image_flashcard_ratio: f64,

    /// Maximum number of PDF pages rendered to images. Default: 15.
    pub max_pdf_images: usize,

    /// Target width of rendered page images in pixels. Default: 1240.
    pub image_width_px: u32,

    /// Per-call timeout for the model request. Default: none.
    pub api_timeout_secs: Option<u64>,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider_name: "mistral".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 24_000,
            max_input_chars: 400_000,
            truncate_budget_chars: 100_000,
            default_flashcard_count: 20,
            default_qcm_count: 15,
            max_flashcard_count: 100,
            max_qcm_count: 100,
            image_flashcard_ratio: 0.3,
            max_pdf_images: 15,
            image_width_px: 1240,
            api_timeout_secs: None,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerationBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("truncate_budget_chars", &self.truncate_budget_chars)
            .field("default_flashcard_count", &self.default_flashcard_count)
            .field("default_qcm_count", &self.default_qcm_count)
            .field("max_flashcard_count", &self.max_flashcard_count)
            .field("max_qcm_count", &self.max_qcm_count)
            .field("image_flashcard_ratio", &self.image_flashcard_ratio)
            .field("max_pdf_images", &self.max_pdf_images)
            .field("image_width_px", &self.image_width_px)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "system_prompt",
                &self.system_prompt.as_ref().map(|p| format!("<{} chars>", p.len())),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn truncate_budget_chars(mut self, n: usize) -> Self {
        self.config.truncate_budget_chars = n;
        self
    }

    pub fn default_flashcard_count(mut self, n: usize) -> Self {
        self.config.default_flashcard_count = n.max(1);
        self
    }

    pub fn default_qcm_count(mut self, n: usize) -> Self {
        self.config.default_qcm_count = n.max(1);
        self
    }

    pub fn max_flashcard_count(mut self, n: usize) -> Self {
        self.config.max_flashcard_count = n;
        self
    }

    pub fn max_qcm_count(mut self, n: usize) -> Self {
        self.config.max_qcm_count = n;
        self
    }

    pub fn image_flashcard_ratio(mut self, ratio: f64) -> Self {
        self.config.image_flashcard_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn max_pdf_images(mut self, n: usize) -> Self {
        self.config.max_pdf_images = n;
        self
    }

    pub fn image_width_px(mut self, px: u32) -> Self {
        self.config.image_width_px = px.max(100);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, FlashGenError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(FlashGenError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.truncate_budget_chars == 0 {
            return Err(FlashGenError::InvalidConfig(
                "truncate_budget_chars must be ≥ 1".into(),
            ));
        }
        if c.truncate_budget_chars > c.max_input_chars {
            return Err(FlashGenError::InvalidConfig(format!(
                "truncate_budget_chars ({}) must not exceed max_input_chars ({})",
                c.truncate_budget_chars, c.max_input_chars
            )));
        }
        if c.default_flashcard_count > c.max_flashcard_count {
            return Err(FlashGenError::InvalidConfig(format!(
                "default_flashcard_count ({}) must not exceed max_flashcard_count ({})",
                c.default_flashcard_count, c.max_flashcard_count
            )));
        }
        if c.default_qcm_count > c.max_qcm_count {
            return Err(FlashGenError::InvalidConfig(format!(
                "default_qcm_count ({}) must not exceed max_qcm_count ({})",
                c.default_qcm_count, c.max_qcm_count
            )));
        }
        if c.model.trim().is_empty() {
            return Err(FlashGenError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 3000.
    pub port: u16,

    /// Root of the upload tree. Uploaded PDFs go to `{upload_dir}/pdf`,
    /// extracted page images to `{upload_dir}/pdf_images/{id}`.
    pub upload_dir: PathBuf,

    /// Optional directory of static UI files served at `/`.
    pub public_dir: Option<PathBuf>,

    /// Maximum accepted PDF upload size in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Maximum JSON request body in bytes. Default: 50 MiB.
    pub max_json_bytes: usize,

    /// Generation settings shared by every request.
    pub generation: GenerationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            public_dir: None,
            max_upload_bytes: 20 * 1024 * 1024,
            max_json_bytes: 50 * 1024 * 1024,
            generation: GenerationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory holding uploaded PDFs while they are processed.
    pub fn pdf_dir(&self) -> PathBuf {
        self.upload_dir.join("pdf")
    }

    /// Directory holding extracted page images, one subdirectory per upload.
    pub fn image_root(&self) -> PathBuf {
        self.upload_dir.join("pdf_images")
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.public_dir = Some(dir.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn max_json_bytes(mut self, n: usize) -> Self {
        self.config.max_json_bytes = n;
        self
    }

    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, FlashGenError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(FlashGenError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_json_bytes == 0 {
            return Err(FlashGenError::InvalidConfig(
                "max_json_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
