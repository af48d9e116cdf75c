//! HTTP error mapping: every failure leaves the server as
//! `(status, {"error": …, "details": …})`.

use crate::error::FlashGenError;
use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] FlashGenError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: Value,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Generation(FlashGenError::InputTooLarge { .. })
            | ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Generation(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match &self {
            ApiError::Generation(err) => (err.to_string(), err.details()),
            ApiError::BadRequest(msg) | ApiError::PayloadTooLarge(msg) => {
                (self.to_string(), Value::String(msg.clone()))
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", error);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, error);
        }

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                ApiError::from(FlashGenError::InputTooLarge { len: 5, max: 4 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ApiError::from(FlashGenError::MissingText), StatusCode::BAD_REQUEST),
            (ApiError::from(FlashGenError::MissingPdf), StatusCode::BAD_REQUEST),
            (
                ApiError::from(FlashGenError::EmptyResponse),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(FlashGenError::MalformedJson {
                    detail: "eof".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::PayloadTooLarge("big".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn response_carries_status() {
        let response = ApiError::from(FlashGenError::MissingText).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
