// Services module: probes, assembly, batching and classifier access

pub mod batch;
pub mod classifier;
pub mod content_fetcher;
pub mod dns_checker;
pub mod feature_assembler;
pub mod html_analyzer;
pub mod probes;
pub mod report;
pub mod ssl_inspector;
pub mod whois_agent;

// Re-export commonly used services
pub use batch::{BatchCoordinator, BatchFailure, BatchReport};
pub use classifier::{Classifier, ClassifierError, RemoteClassifier};
pub use content_fetcher::ContentFetcher;
pub use dns_checker::DnsChecker;
pub use feature_assembler::FeatureAssembler;
pub use html_analyzer::{HtmlAnalyzer, HtmlSignals};
pub use probes::{LiveProbes, NetworkProbes, OfflineProbes};
pub use report::{PredictionRow, ReportError};
pub use ssl_inspector::SslInspector;
pub use whois_agent::WhoisAgent;
