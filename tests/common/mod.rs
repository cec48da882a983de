// Common test utilities and helper structs
// Shared across all test files to avoid duplication
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use phishscan_core::{
    app::AppState,
    app_config::{AppConfig, BatchConfig},
    models::{Feature, Prediction, ProbeError, RawContent, SIGNAL_COUNT},
    services::{
        classifier::{Classifier, ClassifierError},
        BatchCoordinator, FeatureAssembler, NetworkProbes,
    },
};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tower::util::ServiceExt;

/// Page whose every reference stays on the site
pub const CLEAN_PAGE: &str = r#"<html><head>
<link rel="icon" href="/favicon.ico">
<script src="/static/app.js"></script>
</head><body>
<a href="/about">About</a>
<img src="/static/logo.png">
<form action="/login"><input name="user"></form>
</body></html>"#;

// =============================================================================
// STUB PROBES
// =============================================================================

/// Probes with canned outcomes. Tracks how many calls overlap so batch tests
/// can check the concurrency cap.
#[derive(Clone)]
pub struct StubProbes {
    pub content: Result<RawContent, ProbeError>,
    pub certificate_days: Result<i64, ProbeError>,
    pub address: Result<(), ProbeError>,
    pub age_days: Result<i64, ProbeError>,
    pub delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl StubProbes {
    /// Every probe succeeds with values that map to legitimate signals
    pub fn healthy() -> Self {
        Self {
            content: Ok(RawContent {
                status: 200,
                body: CLEAN_PAGE.to_string(),
                final_url: "https://www.example.com/".to_string(),
                truncated: false,
            }),
            certificate_days: Ok(400),
            address: Ok(()),
            age_days: Ok(2000),
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every probe ran and failed
    pub fn failing() -> Self {
        Self {
            content: Err(ProbeError::Network("connection refused".to_string())),
            certificate_days: Err(ProbeError::Tls("handshake failed".to_string())),
            address: Err(ProbeError::NotFound("no A record".to_string())),
            age_days: Err(ProbeError::Timeout(10)),
            ..Self::healthy()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Most fetches observed running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl NetworkProbes for StubProbes {
    async fn fetch(&self, _url: &str) -> Result<RawContent, ProbeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.pause().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.content.clone()
    }

    async fn certificate_days(&self, _host: &str) -> Result<i64, ProbeError> {
        self.certificate_days.clone()
    }

    async fn resolve_address(&self, _domain: &str) -> Result<(), ProbeError> {
        self.address.clone()
    }

    async fn domain_age_days(&self, _domain: &str) -> Result<i64, ProbeError> {
        self.age_days.clone()
    }
}

// =============================================================================
// STUB CLASSIFIER
// =============================================================================

/// Answers with a fixed prediction and counts calls
pub struct StubClassifier {
    pub prediction: Prediction,
    pub calls: AtomicUsize,
    /// Fail with HTTP 500 for inputs that flag a URL shortener
    pub reject_shortened: bool,
}

impl StubClassifier {
    pub fn new(label: i64, value: f64) -> Self {
        Self {
            prediction: Prediction { label, value },
            calls: AtomicUsize::new(0),
            reject_shortened: false,
        }
    }

    pub fn rejecting_shortened(mut self) -> Self {
        self.reject_shortened = true;
        self
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn predict(&self, input: &[i8; SIGNAL_COUNT]) -> Result<Prediction, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_shortened && input[Feature::ShortiningService.index()] == -1 {
            return Err(ClassifierError::Status(500));
        }
        Ok(self.prediction)
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

pub fn assembler(probes: impl NetworkProbes + 'static, deadline: Duration) -> FeatureAssembler {
    FeatureAssembler::new(Arc::new(probes), deadline)
}

pub fn coordinator(
    probes: impl NetworkProbes + 'static,
    max_concurrency: usize,
    deadline: Duration,
) -> BatchCoordinator {
    BatchCoordinator::new(
        Arc::new(assembler(probes, deadline)),
        &BatchConfig {
            max_concurrency,
            max_urls: 50,
        },
    )
}

pub fn test_state(
    probes: impl NetworkProbes + 'static,
    classifier: Option<Arc<dyn Classifier>>,
) -> AppState {
    AppState::with_parts(AppConfig::default(), Arc::new(probes), classifier)
}

// =============================================================================
// HTTP HELPERS
// =============================================================================

pub async fn post_json<T: Serialize>(app: Router, uri: &str, body: &T) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status for response: {:?}",
        response
    );
}
