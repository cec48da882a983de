// Classifier-facing CSV layout: 30 signal columns in schema order, then the label

use chrono::{DateTime, Utc};
use std::io::Write;
use thiserror::Error;

use crate::models::{
    features::{FeatureVector, FEATURE_NAMES, LABEL_COLUMN},
    prediction::Prediction,
};

pub const VALUE_COLUMN: &str = "Result_Value";
pub const URL_COLUMN: &str = "URL";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode CSV record: {0}")]
    Csv(#[from] csv::Error),
}

/// One classified URL in a prediction report
#[derive(Debug, Clone)]
pub struct PredictionRow<'a> {
    pub url: &'a str,
    pub vector: &'a FeatureVector,
    pub prediction: Prediction,
}

/// Header of the 30+1 training layout
pub fn training_header() -> Vec<&'static str> {
    let mut header: Vec<&'static str> = FEATURE_NAMES.to_vec();
    header.push(LABEL_COLUMN);
    header
}

/// Rows in the exact layout the training pipeline consumes (label = placeholder)
pub fn write_training_rows<W: Write>(
    out: &mut W,
    vectors: &[&FeatureVector],
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(training_header())?;

    for vector in vectors {
        writer.write_record(vector.to_row().iter().map(|v| v.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

/// 30 signals, the predicted label in `Result`, then `Result_Value` and `URL`
pub fn write_prediction_report<W: Write>(
    out: &mut W,
    rows: &[PredictionRow<'_>],
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = FEATURE_NAMES.to_vec();
    header.extend([LABEL_COLUMN, VALUE_COLUMN, URL_COLUMN]);
    writer.write_record(&header)?;

    for row in rows {
        let mut fields: Vec<String> = row
            .vector
            .model_input()
            .iter()
            .map(|v| v.to_string())
            .collect();
        fields.push(row.prediction.label.to_string());
        fields.push(row.prediction.value.to_string());
        fields.push(row.url.to_string());
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

/// `report_<host>.csv` for a single-URL download
pub fn report_filename(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host: String = without_scheme
        .split('/')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if host.is_empty() {
        "report.csv".to_string()
    } else {
        format!("report_{}.csv", host)
    }
}

pub fn batch_report_filename(now: DateTime<Utc>) -> String {
    format!("batch_report_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
