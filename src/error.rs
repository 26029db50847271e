use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("A sync operation is already running")]
    SyncInProgress,

    #[error("Failed to initialize cloud storage: {0}")]
    RemoteInit(String),

    #[error("Failed to upload to cloud storage: {0}")]
    RemoteWrite(String),

    #[error("Failed to read from cloud storage: {0}")]
    RemoteRead(String),

    #[error("Invalid data: {0}")]
    Deserialization(String),

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Deserialization(e.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::SyncInProgress => (
                StatusCode::CONFLICT,
                "Sinkronisasi sedang berjalan, tunggu sebentar".to_string(),
            ),
            AppError::RemoteInit(msg) => {
                warn!("cloud init failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Gagal inisialisasi cloud. Data mungkin terlalu besar atau koneksi terputus".to_string(),
                )
            }
            AppError::RemoteWrite(msg) => {
                warn!("cloud push failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Gagal mengunggah data ke cloud".to_string(),
                )
            }
            AppError::RemoteRead(msg) => {
                warn!("cloud pull failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Gagal mengambil data dari cloud. Periksa kunci sync Anda".to_string(),
                )
            }
            AppError::Deserialization(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Format data tidak didukung: {}", msg),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Username atau password salah".to_string(),
            ),
            AppError::Report(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
