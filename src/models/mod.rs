// Data models for feature extraction

pub mod features;
pub mod prediction;
pub mod probe;

pub use features::{
    Feature, FeatureVector, FeatureVectorBuilder, Signal, FEATURE_NAMES, LABEL_COLUMN,
    SIGNAL_COUNT, VECTOR_LEN,
};
pub use prediction::{
    FeatureResponse, MultiUrlRequest, Prediction, PredictionResponse, UrlRequest, Verdict,
};
pub use probe::{ProbeError, ProbeKind, RawContent};
