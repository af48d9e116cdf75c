use crate::export::{to_anki, to_markdown, ExportFormat};
use crate::output::{Flashcard, RevisionSheet};
use crate::server::error::ApiError;
use axum::{
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AnkiBody {
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Deserialize)]
pub struct MarkdownBody {
    pub revision: RevisionSheet,
}

fn attachment(format: ExportFormat, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        body,
    )
        .into_response()
}

/// `POST /export/anki`
pub async fn export_anki(
    payload: Result<Json<AnkiBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    if body.flashcards.is_empty() {
        return Err(ApiError::BadRequest("no flashcards to export".into()));
    }
    Ok(attachment(ExportFormat::Anki, to_anki(&body.flashcards)))
}

/// `POST /export/markdown`
pub async fn export_markdown(
    payload: Result<Json<MarkdownBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    Ok(attachment(ExportFormat::Markdown, to_markdown(&body.revision)))
}
