// Library exports for the phishing feature extraction service
// This file exposes modules and the router for library consumers

pub mod app;
pub mod app_config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::AppConfig;
pub use models::{
    Feature, FeatureVector, Prediction, ProbeError, RawContent, Signal, FEATURE_NAMES,
};
pub use services::{
    BatchCoordinator, BatchReport, Classifier, FeatureAssembler, LiveProbes, NetworkProbes,
    OfflineProbes,
};
pub use utils::{ExtractionError, UrlValidator};

// Re-export handler route builders
pub use handlers::{feature_routes, prediction_routes};

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Full HTTP surface with CORS and request tracing
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    let api = Router::new()
        .merge(feature_routes())
        .merge(prediction_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            },
        })
        .collect();

    base.allow_origin(parsed)
}

// Health check endpoint
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();
    let classifier_loaded = state.classifier.is_some();

    let response = serde_json::json!({
        "status": if classifier_loaded { "healthy" } else { "degraded" },
        "service": "phishscan-core",
        "timestamp": timestamp,
        "components": {
            "classifier": {
                "status": if classifier_loaded { "loaded" } else { "not_configured" },
            },
            "network_probes": {
                "status": if state.config.probes.enabled { "enabled" } else { "disabled" },
                "available_permits": state.batch.available_permits(),
            }
        }
    });

    Json(response)
}
