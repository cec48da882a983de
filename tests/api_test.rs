// HTTP surface: routing, status codes, JSON and CSV bodies

mod common;

use axum::http::{header, StatusCode};
use common::{
    assert_status, body_bytes, body_json, get, post_json, test_state, StubClassifier, StubProbes,
};
use phishscan_core::{app_router, services::Classifier};
use serde_json::json;
use std::sync::{atomic::Ordering, Arc};

fn app_without_model() -> axum::Router {
    app_router(test_state(StubProbes::healthy(), None))
}

fn app_with_model(classifier: Arc<StubClassifier>) -> axum::Router {
    let classifier: Arc<dyn Classifier> = classifier;
    app_router(test_state(StubProbes::healthy(), Some(classifier)))
}

// =============================================================================
// HEALTH
// =============================================================================

#[tokio::test]
async fn test_health_reports_components() {
    let response = get(app_without_model(), "/health").await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["service"], "phishscan-core");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["classifier"]["status"], "not_configured");
    assert_eq!(body["components"]["network_probes"]["status"], "enabled");
}

// =============================================================================
// FEATURES
// =============================================================================

#[tokio::test]
async fn test_features_for_bare_host() {
    let response = post_json(
        app_without_model(),
        "/api/v1/features",
        &json!({ "url": "  www.example.com " }),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["url"], "http://www.example.com");
    let features = body["features"].as_object().unwrap();
    assert_eq!(features.len(), 31);
    assert_eq!(features["Shortining_Service"], 1);
    assert_eq!(features["Page_Rank"], 0);
    assert_eq!(features["Result"], 1);
}

#[tokio::test]
async fn test_invalid_url_is_400_with_rule() {
    let response = post_json(
        app_without_model(),
        "/api/v1/features",
        &json!({ "url": "ftp://files.example.com" }),
    )
    .await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_URL");
    assert_eq!(body["error"], "Invalid URL: Invalid protocol: ftp");
    assert!(body["details"]["rule"].is_string());
}

#[tokio::test]
async fn test_empty_url_is_bad_request() {
    let response =
        post_json(app_without_model(), "/api/v1/features", &json!({ "url": "" })).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_batch_features_report_failures() {
    let response = post_json(
        app_without_model(),
        "/api/v1/features/batch",
        &json!({ "urls": ["http://good.example.com", "not a url", "http://bit.ly/xyz"] }),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(response).await;
    let vectors = body["vectors"].as_object().unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors["http://bit.ly/xyz"]["Shortining_Service"], -1);
    assert_eq!(body["failures"][0]["url"], "not a url");
}

#[tokio::test]
async fn test_empty_url_list_is_rejected() {
    let response =
        post_json(app_without_model(), "/api/v1/features/batch", &json!({ "urls": [] })).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_training_csv_export() {
    let response = post_json(
        app_without_model(),
        "/api/v1/features/batch/csv",
        &json!({ "urls": ["https://www.example.com", "https://shop.example.org"] }),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("having_IP_Address,"));
    assert!(lines[0].ends_with(",Result"));
    assert!(lines.iter().skip(1).all(|l| l.split(',').count() == 31));
}

// =============================================================================
// PREDICTIONS
// =============================================================================

#[tokio::test]
async fn test_predict_without_model_is_503() {
    let response = post_json(
        app_without_model(),
        "/api/v1/predict-url",
        &json!({ "url": "https://www.example.com" }),
    )
    .await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Model not loaded");
    assert_eq!(body["code"], "MODEL_UNAVAILABLE");
}

#[tokio::test]
async fn test_predict_url_returns_verdict() {
    let classifier = Arc::new(StubClassifier::new(-1, -0.8));
    let response = post_json(
        app_with_model(classifier.clone()),
        "/api/v1/predict-url",
        &json!({ "url": "https://www.example.com" }),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["prediction"], "PHISHING");
    assert_eq!(body["status"], "danger");
    assert_eq!(body["result_value"], -0.8);
    assert_eq!(body["message"], "URL is classified as PHISHING");
    assert_eq!(body["features"]["SSLfinal_State"], 1);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_predict_invalid_url_skips_classifier() {
    let classifier = Arc::new(StubClassifier::new(1, 0.9));
    let response = post_json(
        app_with_model(classifier.clone()),
        "/api/v1/predict-url",
        &json!({ "url": "http://localhost" }),
    )
    .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predict_multi_url_csv() {
    let classifier = Arc::new(StubClassifier::new(1, 1.25));
    let response = post_json(
        app_with_model(classifier),
        "/api/v1/predict-multi-url",
        &json!({ "urls": ["https://www.example.com", "bad", "http://bit.ly/xyz"] }),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"batch_report_"));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(",Result,Result_Value,URL"));
    assert!(lines
        .iter()
        .any(|l| l.ends_with(",1,1.25,https://www.example.com")));
}

#[tokio::test]
async fn test_predict_multi_url_skips_classifier_failures() {
    let classifier = Arc::new(StubClassifier::new(1, 0.75).rejecting_shortened());
    let response = post_json(
        app_with_model(classifier.clone()),
        "/api/v1/predict-multi-url",
        &json!({ "urls": ["https://www.example.com", "http://bit.ly/xyz"] }),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",1,0.75,https://www.example.com"));
}

#[tokio::test]
async fn test_predict_multi_url_when_classifier_rejects_all() {
    let classifier = Arc::new(StubClassifier::new(1, 0.75).rejecting_shortened());
    let response = post_json(
        app_with_model(classifier),
        "/api/v1/predict-multi-url",
        &json!({ "urls": ["http://bit.ly/xyz", "http://tinyurl.com/abc"] }),
    )
    .await;

    assert_status(&response, StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "CLASSIFIER_ERROR");
}

#[tokio::test]
async fn test_predict_multi_url_with_nothing_valid() {
    let classifier = Arc::new(StubClassifier::new(1, 1.0));
    let response = post_json(
        app_with_model(classifier),
        "/api/v1/predict-multi-url",
        &json!({ "urls": ["not a url"] }),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "NOTHING_EXTRACTED");
}

#[tokio::test]
async fn test_download_url_report() {
    let classifier = Arc::new(StubClassifier::new(1, 0.5));
    let response = post_json(
        app_with_model(classifier),
        "/api/v1/download-url-report",
        &json!({ "url": "https://www.example.com/login" }),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report_www.example.com.csv\""
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.trim_end().ends_with(",1,0.5,https://www.example.com/login"));
}
