use super::parse_count;
use crate::error::FlashGenError;
use crate::generate::generate_notes;
use crate::output::{GenerationOutput, GenerationRequest};
use crate::server::{error::ApiError, state::AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub flashcard_count: Option<Value>,
    #[serde(default)]
    pub qcm_count: Option<Value>,
}

/// `POST /generate`: study package from pasted text.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationOutput>, ApiError> {
    let Json(body) = payload?;
    let config = &state.config.generation;

    let text = body
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or(FlashGenError::MissingText)?;
    let flashcards = parse_count(
        body.flashcard_count.as_ref(),
        config.default_flashcard_count,
        config.max_flashcard_count,
        "flashcardCount",
    )?;
    let qcm = parse_count(
        body.qcm_count.as_ref(),
        config.default_qcm_count,
        config.max_qcm_count,
        "qcmCount",
    )?;

    info!(
        "POST /generate: {} chars, {} flashcards, {} QCM",
        text.chars().count(),
        flashcards,
        qcm
    );

    let request = GenerationRequest::new(text, flashcards, qcm);
    let output = generate_notes(&request, state.backend.as_ref(), config).await?;
    Ok(Json(output))
}
