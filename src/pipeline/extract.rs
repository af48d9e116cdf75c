//! PDF content extraction: plain text for the prompt, page images for the
//! revision sheet and flashcards.
//!
//! Both operations go through pdfium inside `spawn_blocking`; the library
//! keeps thread-local state and must never run on a Tokio worker.
//!
//! Text extraction is strict: a PDF that cannot be read fails the request.
//! Image extraction is best effort: any failure yields an empty list, since
//! images only decorate a study package that is still useful without them.

use crate::config::GenerationConfig;
use crate::error::FlashGenError;
use crate::pipeline::encode::{page_image_name, write_jpeg};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source of text and page images for an uploaded document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// All text of the document, pages joined by a blank line.
    async fn extract_text(&self, path: &Path) -> Result<String, FlashGenError>;

    /// Render leading pages into `out_dir` and return their public URLs,
    /// each built as `{url_prefix}/{file}`. Never fails; an empty list means
    /// no images.
    async fn extract_images(&self, path: &Path, out_dir: &Path, url_prefix: &str) -> Vec<String>;
}

/// pdfium-backed extractor.
#[derive(Debug, Clone)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
    max_pages: usize,
    width_px: u32,
}

impl PdfiumExtractor {
    pub fn new(max_pages: usize, width_px: u32) -> Self {
        Self {
            library_path: std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from),
            max_pages,
            width_px,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.max_pdf_images, config.image_width_px)
    }

    /// Load pdfium from an explicit file or directory instead of
    /// `PDFIUM_LIB_PATH` / the system library.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

#[async_trait]
impl DocumentExtractor for PdfiumExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, FlashGenError> {
        let path = path.to_path_buf();
        let lib = self.library_path.clone();

        tokio::task::spawn_blocking(move || extract_text_blocking(&path, lib.as_deref()))
            .await
            .map_err(|e| FlashGenError::Internal(format!("Text extraction task panicked: {}", e)))?
    }

    async fn extract_images(&self, path: &Path, out_dir: &Path, url_prefix: &str) -> Vec<String> {
        let path = path.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        let prefix = url_prefix.trim_end_matches('/').to_string();
        let lib = self.library_path.clone();
        let (max_pages, width_px) = (self.max_pages, self.width_px);

        let result = tokio::task::spawn_blocking(move || {
            render_images_blocking(&path, lib.as_deref(), &out_dir, &prefix, max_pages, width_px)
        })
        .await;

        match result {
            Ok(Ok(urls)) => urls,
            Ok(Err(e)) => {
                warn!("Image extraction failed, continuing without images: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Image extraction task panicked: {}", e);
                Vec::new()
            }
        }
    }
}

/// Bind to pdfium: an explicit library file, a directory holding the
/// platform library, or the system library.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, FlashGenError> {
    let bindings = match library_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| {
        FlashGenError::PdfiumBindingFailed(format!(
            "{:?}. Install the pdfium shared library or set PDFIUM_LIB_PATH.",
            e
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn load_error(path: &Path, e: PdfiumError) -> FlashGenError {
    FlashGenError::Extraction {
        path: path.to_path_buf(),
        detail: format!("{:?}", e),
    }
}

fn extract_text_blocking(path: &Path, lib: Option<&Path>) -> Result<String, FlashGenError> {
    let pdfium = bind_pdfium(lib)?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| load_error(path, e))?;

    let mut pages_text = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| FlashGenError::Extraction {
            path: path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        pages_text.push(text.all());
    }

    let text = pages_text.join("\n\n");
    info!(
        "Extracted {} chars of text from {} pages",
        text.chars().count(),
        pages_text.len()
    );

    if text.trim().is_empty() {
        return Err(FlashGenError::Extraction {
            path: path.to_path_buf(),
            detail: "document contains no extractable text".to_string(),
        });
    }
    Ok(text)
}

fn render_images_blocking(
    path: &Path,
    lib: Option<&Path>,
    out_dir: &Path,
    url_prefix: &str,
    max_pages: usize,
    width_px: u32,
) -> Result<Vec<String>, FlashGenError> {
    std::fs::create_dir_all(out_dir).map_err(|e| FlashGenError::Extraction {
        path: out_dir.to_path_buf(),
        detail: format!("cannot create image directory: {e}"),
    })?;

    let pdfium = bind_pdfium(lib)?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| load_error(path, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let render_config = PdfRenderConfig::new().set_target_width(width_px as i32);

    let mut urls = Vec::new();
    for idx in 0..total_pages.min(max_pages) {
        let page_num = idx + 1;
        let page = match pages.get(idx as u16) {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping page {}: {:?}", page_num, e);
                continue;
            }
        };
        let image = match page.render_with_config(&render_config) {
            Ok(bitmap) => bitmap.as_image(),
            Err(e) => {
                warn!("Skipping page {}: render failed: {:?}", page_num, e);
                continue;
            }
        };

        let file_name = page_image_name(page_num);
        let target = out_dir.join(&file_name);
        match write_jpeg(&image, &target) {
            Ok(0) => {
                warn!("Page {} produced an empty image; skipped", page_num);
                let _ = std::fs::remove_file(&target);
            }
            Ok(_) => urls.push(format!("{url_prefix}/{file_name}")),
            Err(e) => warn!("Skipping page {}: encode failed: {}", page_num, e),
        }
    }

    debug!(
        "Rendered {} of {} pages to {}",
        urls.len(),
        total_pages,
        out_dir.display()
    );
    Ok(urls)
}
