// Classifier collaborator: ordered signal row in, label and decision value out

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    features::{FEATURE_NAMES, SIGNAL_COUNT},
    prediction::Prediction,
};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier request failed: {0}")]
    Request(String),

    #[error("Classifier returned HTTP {0}")]
    Status(u16),

    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// `input` is the 30 signals in schema order, label column excluded
    async fn predict(&self, input: &[i8; SIGNAL_COUNT]) -> Result<Prediction, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a [i8],
    columns: &'a [&'static str],
}

#[derive(Debug, Deserialize)]
struct PredictReply {
    label: i64,
    value: f64,
}

/// Model served over HTTP
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn predict(&self, input: &[i8; SIGNAL_COUNT]) -> Result<Prediction, ClassifierError> {
        let body = PredictRequest {
            features: input,
            columns: &FEATURE_NAMES,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let reply: PredictReply = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        debug!("Classifier answered label={} value={}", reply.label, reply.value);

        Ok(Prediction {
            label: reply.label,
            value: reply.value,
        })
    }
}
