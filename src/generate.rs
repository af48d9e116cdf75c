//! Generation entry points: source text or PDF → study package.
//!
//! One request, one model call. The steps are:
//!
//! ```text
//! size check ─▶ truncate ─▶ prompt ─▶ backend ─▶ normalize ─▶ warning
//! ```
//!
//! Every repair made along the way (truncation, back-filled revision fields,
//! padding cards) is reported in [`GenerationOutput::warning`] rather than
//! failing the request.

use crate::config::GenerationConfig;
use crate::error::FlashGenError;
use crate::output::{GenerationOutput, GenerationRequest};
use crate::pipeline::extract::DocumentExtractor;
use crate::pipeline::llm::{GenerationBackend, SamplingParams};
use crate::pipeline::normalize::{normalize_response, NormalizeReport};
use crate::pipeline::{input, truncate};
use crate::prompts::{build_prompt, SYSTEM_PROMPT};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate flashcards, QCM and a revision sheet from plain text.
///
/// # Errors
/// * [`FlashGenError::MissingText`] when the text is blank.
/// * [`FlashGenError::InputTooLarge`] above `config.max_input_chars`.
/// * Any backend failure, or [`FlashGenError::MalformedJson`] when the model
///   answer cannot be parsed.
pub async fn generate_notes(
    request: &GenerationRequest,
    backend: &dyn GenerationBackend,
    config: &GenerationConfig,
) -> Result<GenerationOutput, FlashGenError> {
    let start = Instant::now();

    if request.source_text.trim().is_empty() {
        return Err(FlashGenError::MissingText);
    }
    check_size(&request.source_text, config)?;

    let mut notes = Vec::new();

    let flashcard_count = request.flashcard_count.min(config.max_flashcard_count);
    let qcm_count = request.qcm_count.min(config.max_qcm_count);
    if (flashcard_count, qcm_count) != (request.flashcard_count, request.qcm_count) {
        warn!(
            "Requested counts {}/{} capped to {}/{}",
            request.flashcard_count, request.qcm_count, flashcard_count, qcm_count
        );
        notes.push(format!(
            "The requested counts were capped to {flashcard_count} flashcards and {qcm_count} QCM."
        ));
    }

    let len = request.source_text.chars().count();
    info!(
        "Generating {} flashcards / {} QCM from {} chars with '{}'",
        flashcard_count,
        qcm_count,
        len,
        backend.name()
    );

    // ── Step 1: Truncate ─────────────────────────────────────────────────
    let text = truncate::truncate_text(&request.source_text, config.truncate_budget_chars);
    if truncate::exceeds_budget(&request.source_text, config.truncate_budget_chars) {
        warn!(
            "Source text truncated from {} to {} chars",
            len,
            text.chars().count()
        );
        notes.push(format!(
            "The text was truncated from {} to {} characters to fit the model context.",
            len,
            text.chars().count()
        ));
    }

    // ── Step 2: Prompt + model call ──────────────────────────────────────
    let prompt = build_prompt(&text, flashcard_count, qcm_count, request.images.len());
    let system = config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT);
    let params = SamplingParams::from_config(config);

    let completion = backend.complete(system, &prompt, &params).await?;
    debug!(
        "Model answered with {} chars, usage {:?}",
        completion.content.len(),
        completion.usage
    );

    // ── Step 3: Normalize ────────────────────────────────────────────────
    let normalized = normalize_response(
        &completion.content,
        flashcard_count,
        &request.images,
        config.image_flashcard_ratio,
    )?;
    notes.extend(report_notes(&normalized.report, flashcard_count));

    info!(
        "Generated {} flashcards, {} QCM in {:?}",
        normalized.result.flashcards.len(),
        normalized.result.qcm.len(),
        start.elapsed()
    );

    Ok(GenerationOutput {
        result: normalized.result,
        warning: (!notes.is_empty()).then(|| notes.join(" ")),
        usage: completion.usage,
    })
}

/// Where extracted page images are written and how they are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    pub dir: PathBuf,
    pub url_prefix: String,
}

impl ImageTarget {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

/// Generate a study package from a PDF on disk.
///
/// Text extraction failures are fatal. Page images are best effort: they are
/// written under `images.dir` and referenced as `{url_prefix}/img-N.jpg`.
pub async fn generate_from_pdf(
    path: &Path,
    flashcard_count: usize,
    qcm_count: usize,
    extractor: &dyn DocumentExtractor,
    backend: &dyn GenerationBackend,
    config: &GenerationConfig,
    images: &ImageTarget,
) -> Result<GenerationOutput, FlashGenError> {
    input::check_pdf(path)?;

    let text = extractor.extract_text(path).await?;
    check_size(&text, config)?;

    let images = extractor
        .extract_images(path, &images.dir, &images.url_prefix)
        .await;
    info!("Using {} extracted page images", images.len());

    let request = GenerationRequest::new(text, flashcard_count, qcm_count).with_images(images);
    generate_notes(&request, backend, config).await
}

fn check_size(text: &str, config: &GenerationConfig) -> Result<(), FlashGenError> {
    if truncate::exceeds_budget(text, config.max_input_chars) {
        let len = text.chars().count();
        warn!("Rejecting input of {} chars (max {})", len, config.max_input_chars);
        return Err(FlashGenError::InputTooLarge {
            len,
            max: config.max_input_chars,
        });
    }
    Ok(())
}

fn report_notes(report: &NormalizeReport, requested: usize) -> Vec<String> {
    let mut notes = Vec::new();
    if report.padded_flashcards > 0 {
        notes.push(format!(
            "The model produced {} of the {} requested flashcards; {} placeholder cards were added.",
            requested - report.padded_flashcards,
            requested,
            report.padded_flashcards
        ));
    }
    if !report.backfilled_fields.is_empty() {
        notes.push(format!(
            "Missing revision sections were filled with empty defaults: {}.",
            report.backfilled_fields.join(", ")
        ));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TokenUsage;
    use crate::pipeline::llm::Completion;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedBackend {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedBackend {
        fn new(answer: impl Into<String>) -> Self {
            Self {
                answer: answer.into(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            _system: &str,
            prompt: &str,
            _params: &SamplingParams,
        ) -> Result<Completion, FlashGenError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(Completion {
                content: self.answer.clone(),
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                }),
            })
        }
    }

    struct FixedExtractor {
        text: String,
        images: Vec<String>,
    }

    #[async_trait]
    impl DocumentExtractor for FixedExtractor {
        async fn extract_text(&self, _path: &Path) -> Result<String, FlashGenError> {
            Ok(self.text.clone())
        }

        async fn extract_images(&self, _: &Path, _: &Path, url_prefix: &str) -> Vec<String> {
            self.images
                .iter()
                .map(|f| format!("{url_prefix}/{f}"))
                .collect()
        }
    }

    fn answer(cards: usize) -> String {
        let flashcards: Vec<_> = (0..cards)
            .map(|i| json!({ "question": format!("Q{i}?"), "answer": "A" }))
            .collect();
        json!({
            "flashcards": flashcards,
            "qcm": [{ "question": "Which?", "options": ["a", "b", "c", "d"], "correct": 0 }],
            "revision": {
                "title": "T", "introduction": "I", "summary": "S", "definitions": [],
                "methodology": "", "examples": [], "practical_applications": "",
                "key_points": [], "must_know": [], "conclusion": "", "tips": [],
                "structure": [], "images": []
            }
        })
        .to_string()
    }

    fn small_config() -> GenerationConfig {
        GenerationConfig::builder()
            .max_input_chars(1_000)
            .truncate_budget_chars(100)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn complete_answer_has_no_warning() {
        let backend = CannedBackend::new(answer(5));
        let request = GenerationRequest::new("Photosynthesis converts light.", 5, 1);
        let out = generate_notes(&request, &backend, &small_config()).await.unwrap();
        assert_eq!(out.result.flashcards.len(), 5);
        assert!(out.warning.is_none());
        assert_eq!(out.usage.map(|u| u.completion_tokens), Some(20));

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Photosynthesis converts light."));
        assert!(prompts[0].contains("EXACTLY 5 flashcards"));
    }

    #[test]
    fn short_answer_is_padded_with_warning() {
        let backend = CannedBackend::new(answer(3));
        let request = GenerationRequest::new("Some text.", 8, 2);
        let out = tokio_test::block_on(generate_notes(&request, &backend, &small_config())).unwrap();
        assert_eq!(out.result.flashcards.len(), 8);
        let warning = out.warning.unwrap();
        assert!(warning.contains("3 of the 8"), "{warning}");
        assert!(warning.contains("5 placeholder"), "{warning}");
    }

    #[tokio::test]
    async fn long_text_is_truncated_and_reported() {
        let backend = CannedBackend::new(answer(2));
        let text = "word ".repeat(60); // 300 chars, budget 100
        let request = GenerationRequest::new(text, 2, 1);
        let out = generate_notes(&request, &backend, &small_config()).await.unwrap();
        assert!(out.warning.unwrap().contains("truncated from 300 to 100"));
        assert!(!backend.prompts.lock().unwrap()[0].contains(&"word ".repeat(30)));
    }

    #[tokio::test]
    async fn counts_above_the_maximum_are_capped() {
        let backend = CannedBackend::new(answer(4));
        let config = GenerationConfig::builder()
            .default_flashcard_count(5)
            .max_flashcard_count(6)
            .default_qcm_count(2)
            .max_qcm_count(3)
            .build()
            .unwrap();
        let request = GenerationRequest::new("Some text.", usize::MAX, 1_000_000);
        let out = generate_notes(&request, &backend, &config).await.unwrap();

        assert_eq!(out.result.flashcards.len(), 6);
        let warning = out.warning.unwrap();
        assert!(warning.contains("capped to 6 flashcards and 3 QCM"), "{warning}");
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("EXACTLY 6 flashcards"));
        assert!(!prompts[0].contains(&usize::MAX.to_string()));
    }

    #[tokio::test]
    async fn oversized_text_never_reaches_backend() {
        let backend = CannedBackend::new(answer(2));
        let request = GenerationRequest::new("x".repeat(1_001), 2, 1);
        let err = generate_notes(&request, &backend, &small_config())
            .await
            .unwrap_err();
        assert!(matches!(err, FlashGenError::InputTooLarge { len: 1_001, max: 1_000 }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn blank_text_is_missing() {
        let backend = CannedBackend::new(answer(2));
        let request = GenerationRequest::new("   \n", 2, 1);
        let err = generate_notes(&request, &backend, &small_config())
            .await
            .unwrap_err();
        assert!(matches!(err, FlashGenError::MissingText));
    }

    #[tokio::test]
    async fn malformed_answer_fails() {
        let backend = CannedBackend::new("I cannot help with that.");
        let request = GenerationRequest::new("Text.", 2, 1);
        let err = generate_notes(&request, &backend, &small_config())
            .await
            .unwrap_err();
        assert!(matches!(err, FlashGenError::MalformedJson { .. }));
    }

    #[tokio::test]
    async fn custom_system_prompt_is_used() {
        struct SystemEcho(Mutex<Option<String>>);

        #[async_trait]
        impl GenerationBackend for SystemEcho {
            fn name(&self) -> &str {
                "echo"
            }
            async fn complete(
                &self,
                system: &str,
                _prompt: &str,
                _params: &SamplingParams,
            ) -> Result<Completion, FlashGenError> {
                *self.0.lock().unwrap() = Some(system.to_string());
                Ok(Completion {
                    content: answer(1),
                    usage: None,
                })
            }
        }

        let backend = SystemEcho(Mutex::new(None));
        let config = GenerationConfig::builder()
            .system_prompt("Be brief.")
            .build()
            .unwrap();
        let request = GenerationRequest::new("Text.", 1, 1);
        generate_notes(&request, &backend, &config).await.unwrap();
        assert_eq!(backend.0.lock().unwrap().as_deref(), Some("Be brief."));
    }

    fn fake_pdf() -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4\n").unwrap();
        f
    }

    #[tokio::test]
    async fn pdf_images_reach_cards_and_sheet() {
        let pdf = fake_pdf();
        let extractor = FixedExtractor {
            text: "Cells divide.".to_string(),
            images: vec!["img-1.jpg".into(), "img-2.jpg".into()],
        };
        let backend = CannedBackend::new(answer(10));
        let out = generate_from_pdf(
            pdf.path(),
            10,
            3,
            &extractor,
            &backend,
            &small_config(),
            &ImageTarget::new("/unused", "/uploads/pdf_images/abcd1234"),
        )
        .await
        .unwrap();

        assert_eq!(
            out.result.flashcards[0].image.as_deref(),
            Some("/uploads/pdf_images/abcd1234/img-1.jpg")
        );
        assert_eq!(out.result.revision.images.len(), 2);
        assert!(backend.prompts.lock().unwrap()[0].contains("2 images were extracted"));
    }

    #[tokio::test]
    async fn pdf_with_too_much_text_is_rejected() {
        let pdf = fake_pdf();
        let extractor = FixedExtractor {
            text: "y".repeat(2_000),
            images: vec![],
        };
        let backend = CannedBackend::new(answer(1));
        let err = generate_from_pdf(
            pdf.path(),
            1,
            1,
            &extractor,
            &backend,
            &small_config(),
            &ImageTarget::new("/unused", "/u"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FlashGenError::InputTooLarge { .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_before_extraction() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GIF89a").unwrap();
        let extractor = FixedExtractor {
            text: "unused".into(),
            images: vec![],
        };
        let backend = CannedBackend::new(answer(1));
        let err = generate_from_pdf(
            file.path(),
            1,
            1,
            &extractor,
            &backend,
            &small_config(),
            &ImageTarget::new("/unused", "/u"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FlashGenError::NotAPdf { .. }));
    }
}
