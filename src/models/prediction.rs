// Request/response models for the extraction and prediction endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::features::FeatureVector;

// =============================================================================
// REQUEST MODELS
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UrlRequest {
    #[validate(length(min = 1, max = 8192, message = "URL must be 1-8192 characters"))]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MultiUrlRequest {
    #[validate(length(min = 1, message = "URL list cannot be empty"))]
    pub urls: Vec<String>,
}

// =============================================================================
// CLASSIFIER OUTPUT
// =============================================================================

/// What the external classifier returned for one vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Safe,
    Phishing,
}

impl Verdict {
    /// Label 1 is the legitimate class; everything else is treated as phishing
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Verdict::Safe
        } else {
            Verdict::Phishing
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::Phishing => "PHISHING",
        }
    }

    /// UI status tag
    pub fn status(self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::Phishing => "danger",
        }
    }
}

// =============================================================================
// RESPONSE MODELS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FeatureResponse {
    pub url: String,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub url: String,
    pub prediction: Verdict,
    pub status: String,
    pub result_value: f64,
    pub message: String,
    pub features: FeatureVector,
}

impl PredictionResponse {
    pub fn new(url: String, prediction: Prediction, features: FeatureVector) -> Self {
        let verdict = Verdict::from_label(prediction.label);
        Self {
            success: true,
            message: format!("URL is classified as {}", verdict.as_str()),
            url,
            prediction: verdict,
            status: verdict.status().to_string(),
            result_value: prediction.value,
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_label() {
        assert_eq!(Verdict::from_label(1), Verdict::Safe);
        assert_eq!(Verdict::from_label(-1), Verdict::Phishing);
        assert_eq!(Verdict::from_label(0), Verdict::Phishing);
        assert_eq!(Verdict::Phishing.status(), "danger");
    }

    #[test]
    fn test_request_validation() {
        let empty = MultiUrlRequest { urls: vec![] };
        assert!(empty.validate().is_err());

        let ok = UrlRequest {
            url: "example.com".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
