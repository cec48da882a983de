// HTTP handlers for feature extraction and prediction

pub mod features;
pub mod predictions;

use crate::app::AppState;
use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

// Extraction routes
pub fn feature_routes() -> Router<AppState> {
    Router::new()
        .route("/features", post(features::extract_features))
        .route("/features/batch", post(features::extract_batch))
        .route("/features/batch/csv", post(features::export_training_rows))
}

// Classification routes
pub fn prediction_routes() -> Router<AppState> {
    Router::new()
        .route("/predict-url", post(predictions::predict_url))
        .route("/predict-multi-url", post(predictions::predict_multi_url))
        .route("/download-url-report", post(predictions::download_url_report))
}

/// CSV body served as a download
pub(crate) fn csv_attachment(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
