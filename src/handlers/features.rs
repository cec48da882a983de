// Feature extraction endpoints

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    handlers::csv_attachment,
    models::prediction::{FeatureResponse, MultiUrlRequest, UrlRequest},
    services::report::{batch_report_filename, write_training_rows},
    utils::{extraction_errors::ExtractionError, url_validator::normalize_input},
};

// =============================================================================
// EXTRACTION HANDLERS
// =============================================================================

/// Extract the 31-column vector for one URL
/// POST /api/v1/features
pub async fn extract_features(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ExtractionError::from(e).into_response();
    }

    let url = match normalize_input(&request.url) {
        Some(url) => url,
        None => {
            return ExtractionError::BadRequest("URL cannot be empty".to_string()).into_response()
        },
    };

    match state.batch.extract_one(&url).await {
        Ok(features) => {
            info!("Extracted features for {}", url);
            Json(FeatureResponse { url, features }).into_response()
        },
        Err(e) => {
            warn!("Extraction failed for {}: {}", url, e);
            e.into_response()
        },
    }
}

/// Extract vectors for a URL list; bad URLs are reported, not fatal
/// POST /api/v1/features/batch
pub async fn extract_batch(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ExtractionError::from(e).into_response();
    }

    match state.batch.extract_batch(&request.urls).await {
        Ok(report) => {
            info!(
                "Batch finished: {} vectors, {} failures",
                report.len(),
                report.failures.len()
            );
            Json(report).into_response()
        },
        Err(e) => e.into_response(),
    }
}

/// Batch extraction rendered in the training layout (30 signals + `Result`)
/// POST /api/v1/features/batch/csv
pub async fn export_training_rows(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ExtractionError::from(e).into_response();
    }

    let report = match state.batch.extract_batch(&request.urls).await {
        Ok(report) => report,
        Err(e) => return e.into_response(),
    };
    if report.is_empty() {
        return ExtractionError::NothingExtracted.into_response();
    }

    let vectors: Vec<_> = report.vectors.values().collect();
    let mut body = Vec::new();
    if let Err(e) = write_training_rows(&mut body, &vectors) {
        return ExtractionError::from(e).into_response();
    }

    csv_attachment(&batch_report_filename(chrono::Utc::now()), body)
}
