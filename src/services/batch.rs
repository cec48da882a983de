// Fan a URL list out to independent extractions and fan results back in by URL

use futures_util::{
    future::FutureExt,
    stream::{self, StreamExt},
};
use serde::Serialize;
use std::{collections::BTreeMap, panic::AssertUnwindSafe, sync::Arc};
use tokio::sync::Semaphore;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    app_config::BatchConfig,
    models::features::FeatureVector,
    services::feature_assembler::FeatureAssembler,
    utils::{extraction_errors::ExtractionError, url_validator::normalize_input},
};

// =============================================================================
// DATA STRUCTURES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub url: String,
    pub reason: String,
}

/// Vectors keyed by the URL that produced them. URLs that failed validation
/// or extraction appear only in `failures`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub vectors: BTreeMap<String, FeatureVector>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

// =============================================================================
// BATCH COORDINATOR
// =============================================================================

pub struct BatchCoordinator {
    assembler: Arc<FeatureAssembler>,
    /// Shared by every batch and single extraction this coordinator runs
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    max_urls: usize,
}

impl BatchCoordinator {
    pub fn new(assembler: Arc<FeatureAssembler>, config: &BatchConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        Self {
            assembler,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            max_urls: config.max_urls,
        }
    }

    /// Permits currently free in the shared worker budget
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Single-URL mode: normalize, wait for a permit, extract. Errors surface.
    pub async fn extract_one(&self, raw: &str) -> Result<FeatureVector, ExtractionError> {
        let url = normalize_input(raw)
            .ok_or_else(|| ExtractionError::BadRequest("URL cannot be empty".to_string()))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractionError::InternalError)?;

        self.assembler.extract(&url).await
    }

    /// Batch mode: each URL is an isolated unit; failures are dropped into
    /// `failures` and never affect siblings. Dropping the returned future
    /// cancels every in-flight extraction and returns their permits.
    pub async fn extract_batch(&self, urls: &[String]) -> Result<BatchReport, ExtractionError> {
        let mut normalized: Vec<String> = Vec::with_capacity(urls.len());
        for url in urls.iter().filter_map(|raw| normalize_input(raw)) {
            if !normalized.contains(&url) {
                normalized.push(url);
            }
        }

        if normalized.is_empty() {
            return Err(ExtractionError::EmptyBatch);
        }
        if normalized.len() > self.max_urls {
            return Err(ExtractionError::TooManyUrls {
                count: normalized.len(),
                max: self.max_urls,
            });
        }

        let span = info_span!("batch", batch_id = %Uuid::new_v4(), size = normalized.len());

        async move {
            info!("Starting batch extraction of {} URLs", normalized.len());

            let outcomes: Vec<(String, Result<FeatureVector, ExtractionError>)> =
                stream::iter(normalized)
                    .map(|url| async move {
                        let result = self.extract_isolated(&url).await;
                        (url, result)
                    })
                    .buffer_unordered(self.max_concurrency)
                    .collect()
                    .await;

            let mut report = BatchReport::default();
            for (url, result) in outcomes {
                match result {
                    Ok(vector) => {
                        report.vectors.insert(url, vector);
                    },
                    Err(e) => {
                        warn!("Dropping {} from batch: {}", url, e);
                        report.failures.push(BatchFailure {
                            url,
                            reason: e.to_string(),
                        });
                    },
                }
            }

            info!(
                "Batch finished: {} vectors, {} dropped",
                report.vectors.len(),
                report.failures.len()
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// One extraction under a permit; a panic is contained to this URL
    async fn extract_isolated(&self, url: &str) -> Result<FeatureVector, ExtractionError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractionError::InternalError)?;

        match AssertUnwindSafe(self.assembler.extract(url))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::ExtractionFailure {
                url: url.to_string(),
                reason: "extraction worker panicked".to_string(),
            }),
        }
    }
}
