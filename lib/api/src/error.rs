use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use colmatch_core::EmbeddingError;
use colmatch_mapping::WorkflowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error(transparent)]
    Schema(#[from] colmatch_core::Error),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Background task failed: {0}")]
    Blocking(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) | ApiError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Schema(colmatch_core::Error::Embedding(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Schema(colmatch_core::Error::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Schema(_) => StatusCode::BAD_REQUEST,
            ApiError::Embedding(_) => StatusCode::BAD_GATEWAY,
            ApiError::Workflow(WorkflowError::UnknownColumn(_)) => StatusCode::NOT_FOUND,
            ApiError::Workflow(_) => StatusCode::CONFLICT,
            ApiError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Workflow(e) => tracing::debug!(error = %e, "Rejected workflow action"),
            e => tracing::warn!(error = %e, "Request failed"),
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
