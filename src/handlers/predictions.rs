// Prediction endpoints backed by the external classifier

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    handlers::csv_attachment,
    models::{
        features::FeatureVector,
        prediction::{MultiUrlRequest, PredictionResponse, UrlRequest},
    },
    services::{
        classifier::Classifier,
        report::{batch_report_filename, report_filename, write_prediction_report, PredictionRow},
    },
    utils::{
        extraction_errors::{ExtractionError, ExtractionResult},
        url_validator::normalize_input,
    },
};

// =============================================================================
// HELPERS
// =============================================================================

fn classifier(state: &AppState) -> ExtractionResult<Arc<dyn Classifier>> {
    state
        .classifier
        .clone()
        .ok_or(ExtractionError::ModelUnavailable)
}

/// Validate, normalize and extract a single URL
async fn extract_single(
    state: &AppState,
    request: &UrlRequest,
) -> ExtractionResult<(String, FeatureVector)> {
    request.validate()?;
    let url = normalize_input(&request.url)
        .ok_or_else(|| ExtractionError::BadRequest("URL cannot be empty".to_string()))?;
    let vector = state.batch.extract_one(&url).await?;
    Ok((url, vector))
}

fn render_report(rows: &[PredictionRow<'_>]) -> ExtractionResult<Vec<u8>> {
    let mut body = Vec::new();
    write_prediction_report(&mut body, rows)?;
    Ok(body)
}

// =============================================================================
// PREDICTION HANDLERS
// =============================================================================

/// Classify one URL
/// POST /api/v1/predict-url
pub async fn predict_url(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> impl IntoResponse {
    let classifier = match classifier(&state) {
        Ok(classifier) => classifier,
        Err(e) => return e.into_response(),
    };

    let (url, vector) = match extract_single(&state, &request).await {
        Ok(extracted) => extracted,
        Err(e) => return e.into_response(),
    };

    match classifier.predict(&vector.model_input()).await {
        Ok(prediction) => {
            info!("Classified {} with label {}", url, prediction.label);
            Json(PredictionResponse::new(url, prediction, vector)).into_response()
        },
        Err(e) => {
            error!("Classifier failed for {}: {}", url, e);
            ExtractionError::from(e).into_response()
        },
    }
}

/// Classify a URL list and return the CSV report
/// POST /api/v1/predict-multi-url
pub async fn predict_multi_url(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> impl IntoResponse {
    let classifier = match classifier(&state) {
        Ok(classifier) => classifier,
        Err(e) => return e.into_response(),
    };
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

    // A URL the classifier rejects is dropped from the report, like a failed extraction
    let mut rows = Vec::with_capacity(report.len());
    let mut last_error = None;
    for (url, vector) in &report.vectors {
        match classifier.predict(&vector.model_input()).await {
            Ok(prediction) => rows.push(PredictionRow {
                url,
                vector,
                prediction,
            }),
            Err(e) => {
                warn!("Classifier failed for {}, skipping: {}", url, e);
                last_error = Some(e);
            },
        }
    }

    if rows.is_empty() {
        if let Some(e) = last_error {
            error!("Classifier failed for every URL in the batch: {}", e);
            return ExtractionError::from(e).into_response();
        }
    }

    match render_report(&rows) {
        Ok(body) => csv_attachment(&batch_report_filename(chrono::Utc::now()), body),
        Err(e) => e.into_response(),
    }
}

/// Classify one URL and return its CSV report
/// POST /api/v1/download-url-report
pub async fn download_url_report(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> impl IntoResponse {
    let classifier = match classifier(&state) {
        Ok(classifier) => classifier,
        Err(e) => return e.into_response(),
    };

    let (url, vector) = match extract_single(&state, &request).await {
        Ok(extracted) => extracted,
        Err(e) => return e.into_response(),
    };

    let prediction = match classifier.predict(&vector.model_input()).await {
        Ok(prediction) => prediction,
        Err(e) => return ExtractionError::from(e).into_response(),
    };

    let rows = [PredictionRow {
        url: &url,
        vector: &vector,
        prediction,
    }];
    match render_report(&rows) {
        Ok(body) => csv_attachment(&report_filename(&url), body),
        Err(e) => e.into_response(),
    }
}
