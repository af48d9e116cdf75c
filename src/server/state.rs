use crate::config::ServerConfig;
use crate::error::FlashGenError;
use crate::pipeline::extract::{DocumentExtractor, PdfiumExtractor};
use crate::pipeline::llm::{resolve_backend, GenerationBackend};
use std::sync::Arc;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub backend: Arc<dyn GenerationBackend>,
    pub extractor: Arc<dyn DocumentExtractor>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        backend: Arc<dyn GenerationBackend>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            extractor,
        }
    }

    /// Build the model backend and the pdfium extractor from configuration.
    ///
    /// Fails when no backend can be constructed, e.g. a missing API key.
    pub fn from_config(config: ServerConfig) -> Result<Self, FlashGenError> {
        let backend = resolve_backend(&config.generation)?;
        let extractor = Arc::new(PdfiumExtractor::from_config(&config.generation));
        Ok(Self::new(config, backend, extractor))
    }
}
