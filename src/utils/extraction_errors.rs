// Error types surfaced by extraction, batch and prediction operations

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::utils::url_validator::ValidationError;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid URL: {0}")]
    Validation(#[from] ValidationError),

    #[error("Feature extraction failed for {url}: {reason}")]
    ExtractionFailure { url: String, reason: String },

    #[error("URL list cannot be empty")]
    EmptyBatch,

    #[error("No valid features could be extracted from any of the URLs")]
    NothingExtracted,

    #[error("Too many URLs: {count} (max {max})")]
    TooManyUrls { count: usize, max: usize },

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Prediction failed: {0}")]
    Classifier(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Internal server error")]
    InternalError,
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<validator::ValidationErrors> for ExtractionError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors
                    .iter()
                    .map(move |e| format!("{}: {}", field, e.message.as_ref().unwrap_or(&e.code)))
            })
            .collect();

        ExtractionError::BadRequest(messages.join(", "))
    }
}

impl From<crate::services::classifier::ClassifierError> for ExtractionError {
    fn from(err: crate::services::classifier::ClassifierError) -> Self {
        ExtractionError::Classifier(err.to_string())
    }
}

impl From<crate::services::report::ReportError> for ExtractionError {
    fn from(err: crate::services::report::ReportError) -> Self {
        ExtractionError::Report(err.to_string())
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ExtractionErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ExtractionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractionError::Validation(_)
            | ExtractionError::EmptyBatch
            | ExtractionError::TooManyUrls { .. }
            | ExtractionError::BadRequest(_) => StatusCode::BAD_REQUEST,

            ExtractionError::ExtractionFailure { .. } | ExtractionError::NothingExtracted => {
                StatusCode::UNPROCESSABLE_ENTITY
            },

            ExtractionError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ExtractionError::Classifier(_) => StatusCode::BAD_GATEWAY,

            ExtractionError::Report(_) | ExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::Validation(_) => "INVALID_URL",
            ExtractionError::ExtractionFailure { .. } => "EXTRACTION_FAILED",
            ExtractionError::EmptyBatch => "EMPTY_BATCH",
            ExtractionError::NothingExtracted => "NOTHING_EXTRACTED",
            ExtractionError::TooManyUrls { .. } => "TOO_MANY_URLS",
            ExtractionError::ModelUnavailable => "MODEL_UNAVAILABLE",
            ExtractionError::Classifier(_) => "CLASSIFIER_ERROR",
            ExtractionError::BadRequest(_) => "BAD_REQUEST",
            ExtractionError::Report(_) => "REPORT_ERROR",
            ExtractionError::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ExtractionErrorResponse {
        let details = match self {
            ExtractionError::Validation(err) => Some(serde_json::json!({
                "rule": err.rule(),
                "reason": err.to_string(),
            })),
            ExtractionError::TooManyUrls { count, max } => {
                Some(serde_json::json!({ "count": count, "max": max }))
            },
            ExtractionError::ExtractionFailure { url, .. } => {
                Some(serde_json::json!({ "url": url }))
            },
            _ => None,
        };

        ExtractionErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details,
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// RESULT TYPE
// =============================================================================

pub type ExtractionResult<T> = Result<T, ExtractionError>;

// =============================================================================
// TESTS
// =============================================================================
