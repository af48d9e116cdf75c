use super::parse_count_field;
use crate::error::FlashGenError;
use crate::generate::{generate_from_pdf, ImageTarget};
use crate::output::GenerationOutput;
use crate::server::{error::ApiError, state::AppState};
use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{debug, info};

/// Public URL root of extracted page images.
pub const IMAGE_URL_ROOT: &str = "/uploads/pdf_images";

#[derive(Default)]
struct UploadForm {
    pdf: Option<(String, Vec<u8>)>,
    flashcard_count: Option<String>,
    qcm_count: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await?;
                form.pdf = Some((file_name, bytes.to_vec()));
            }
            "flashcardCount" => form.flashcard_count = Some(field.text().await?),
            "qcmCount" => form.qcm_count = Some(field.text().await?),
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }
    Ok(form)
}

/// `POST /upload-pdf`: study package from an uploaded PDF.
///
/// The upload lives in a temporary file that is removed when the request
/// ends, successful or not. Page images are kept under a fresh 8-character
/// directory so they stay reachable from the returned URLs.
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GenerationOutput>, ApiError> {
    let form = read_form(multipart).await?;
    let config = &state.config;

    let (file_name, bytes) = form
        .pdf
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or(FlashGenError::MissingPdf)?;
    if bytes.len() > config.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "PDF is {} bytes, limit {}",
            bytes.len(),
            config.max_upload_bytes
        )));
    }

    let generation = &config.generation;
    let flashcards = parse_count_field(
        form.flashcard_count.as_deref(),
        generation.default_flashcard_count,
        generation.max_flashcard_count,
        "flashcardCount",
    )?;
    let qcm = parse_count_field(
        form.qcm_count.as_deref(),
        generation.default_qcm_count,
        generation.max_qcm_count,
        "qcmCount",
    )?;
    info!(
        "POST /upload-pdf: '{}' ({} bytes), {} flashcards, {} QCM",
        file_name,
        bytes.len(),
        flashcards,
        qcm
    );

    let pdf_dir = config.pdf_dir();
    tokio::fs::create_dir_all(&pdf_dir)
        .await
        .map_err(|e| FlashGenError::Internal(format!("cannot create {}: {e}", pdf_dir.display())))?;
    let upload = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(&pdf_dir)
        .map_err(|e| FlashGenError::Internal(format!("cannot create temp file: {e}")))?;
    tokio::fs::write(upload.path(), &bytes)
        .await
        .map_err(|e| FlashGenError::Internal(format!("cannot store upload: {e}")))?;

    let id = short_id();
    let images = ImageTarget::new(
        config.image_root().join(&id),
        format!("{IMAGE_URL_ROOT}/{id}"),
    );

    let output = generate_from_pdf(
        upload.path(),
        flashcards,
        qcm,
        state.extractor.as_ref(),
        state.backend.as_ref(),
        generation,
        &images,
    )
    .await?;

    Ok(Json(output))
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_eight_hex_chars() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, short_id());
    }
}
