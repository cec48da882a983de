// Application state shared across handlers
use std::sync::Arc;

use tracing::info;

use crate::{
    app_config::AppConfig,
    services::{
        BatchCoordinator, Classifier, FeatureAssembler, LiveProbes, NetworkProbes, OfflineProbes,
        RemoteClassifier,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub batch: Arc<BatchCoordinator>,
    /// `None` when no model endpoint is configured
    pub classifier: Option<Arc<dyn Classifier>>,
}

impl AppState {
    /// Wire probes, assembler, batch coordinator and classifier from config
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let probes: Arc<dyn NetworkProbes> = if config.probes.enabled {
            Arc::new(LiveProbes::from_config(&config.probes)?)
        } else {
            info!("Network probes disabled; only lexical signals will carry data");
            Arc::new(OfflineProbes)
        };

        let classifier: Option<Arc<dyn Classifier>> = match &config.classifier.endpoint_url {
            Some(endpoint) => {
                info!("Using model endpoint {}", endpoint);
                Some(Arc::new(RemoteClassifier::new(
                    endpoint.clone(),
                    std::time::Duration::from_secs(config.classifier.timeout),
                )?))
            },
            None => None,
        };

        Ok(Self::with_parts(config, probes, classifier))
    }

    /// Build state around caller-supplied probes and classifier
    pub fn with_parts(
        config: AppConfig,
        probes: Arc<dyn NetworkProbes>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        let assembler = Arc::new(FeatureAssembler::new(
            probes,
            config.probes.extraction_deadline(),
        ));
        let batch = Arc::new(BatchCoordinator::new(assembler, &config.batch));

        Self {
            config: Arc::new(config),
            batch,
            classifier,
        }
    }
}
