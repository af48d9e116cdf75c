//! HTTP surface: axum router, shared state and error mapping.
//!
//! | Method | Path                               | Handler                      |
//! |--------|------------------------------------|------------------------------|
//! | POST   | `/generate`                        | [`routes::generate`]         |
//! | POST   | `/upload-pdf`                      | [`routes::upload`]           |
//! | POST   | `/export/anki`                     | [`routes::export`]           |
//! | POST   | `/export/markdown`                 | [`routes::export`]           |
//! | GET    | `/health`                          | [`routes::health`]           |
//! | GET    | `/uploads/pdf_images/{id}/{file}`  | static page images           |
//! | GET    | `/*`                               | optional static UI directory |

pub mod error;
pub mod routes;
pub mod state;

use crate::config::ServerConfig;
use crate::error::FlashGenError;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use routes::{
    export::{export_anki, export_markdown},
    generate::generate,
    health::health,
    upload::{upload_pdf, IMAGE_URL_ROOT},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

pub use error::ApiError;
pub use state::AppState;

/// Room for multipart boundaries and the count fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let json_limit = state.config.max_json_bytes;
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    let mut app = Router::new()
        .route(
            "/generate",
            post(generate).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route(
            "/upload-pdf",
            post(upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/export/anki",
            post(export_anki).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route(
            "/export/markdown",
            post(export_markdown).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route("/health", get(health))
        .nest_service(IMAGE_URL_ROOT, ServeDir::new(state.config.image_root()));

    if let Some(public) = &state.config.public_dir {
        app = app.fallback_service(ServeDir::new(public));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Create the upload directories, bind and serve until the process stops.
pub async fn serve(state: AppState) -> Result<(), FlashGenError> {
    let config = state.config.clone();
    for dir in [config.pdf_dir(), config.image_root()] {
        std::fs::create_dir_all(&dir).map_err(|e| {
            FlashGenError::Internal(format!("cannot create {}: {e}", dir.display()))
        })?;
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FlashGenError::Internal(format!("cannot bind {addr}: {e}")))?;
    info!(
        "Listening on http://{} (backend '{}')",
        addr,
        state.backend.name()
    );

    axum::serve(listener, router(state))
        .await
        .map_err(|e| FlashGenError::Internal(format!("server error: {e}")))
}
