// Per-URL pipeline: validate, decompose, probe concurrently, assemble
// Fallback signals for failed probes are decided here and nowhere else

use lazy_static::lazy_static;
use regex::Regex;
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::{
    models::{
        features::{Feature, FeatureVector, FeatureVectorBuilder, Signal},
        probe::{ProbeError, ProbeKind, RawContent},
    },
    services::{
        html_analyzer::HtmlAnalyzer, probes::NetworkProbes, ssl_inspector::classify_expiry,
        whois_agent::classify_age,
    },
    utils::{
        domain::DomainIdentity,
        extraction_errors::ExtractionError,
        url_validator::{UrlValidator, ValidatedUrl},
    },
};

// =============================================================================
// CONSTANTS
// =============================================================================

lazy_static! {
    static ref IPV4_HOST: Regex =
        Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("Invalid IPv4 host regex");
}

/// Known link-shortening services
pub const SHORTENERS: [&str; 8] = [
    "bit.ly",
    "goo.gl",
    "tinyurl.com",
    "ow.ly",
    "t.co",
    "is.gd",
    "buff.ly",
    "adf.ly",
];

const STANDARD_PORTS: [&str; 2] = ["80", "443"];

// =============================================================================
// FEATURE ASSEMBLER
// =============================================================================

pub struct FeatureAssembler {
    probes: Arc<dyn NetworkProbes>,
    validator: UrlValidator,
    deadline: Duration,
}

/// Raw outcome of the four probes for one URL
struct ProbeOutcomes {
    content: Result<RawContent, ProbeError>,
    /// `None` when the URL is not https and no handshake was attempted
    certificate_days: Option<Result<i64, ProbeError>>,
    address: Result<(), ProbeError>,
    age_days: Result<i64, ProbeError>,
}

impl FeatureAssembler {
    pub fn new(probes: Arc<dyn NetworkProbes>, deadline: Duration) -> Self {
        Self {
            probes,
            validator: UrlValidator::new(),
            deadline,
        }
    }

    /// URL -> complete vector. Only validation and a blown deadline fail;
    /// probe failures are folded into default signals.
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> Result<FeatureVector, ExtractionError> {
        let validated = self.validator.validate(url)?;

        match timeout(self.deadline, self.assemble(&validated)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Extraction deadline of {}s exceeded for {}",
                    self.deadline.as_secs(),
                    url
                );
                Err(ExtractionError::ExtractionFailure {
                    url: url.to_string(),
                    reason: format!("deadline of {}s exceeded", self.deadline.as_secs()),
                })
            },
        }
    }

    async fn assemble(&self, url: &ValidatedUrl) -> Result<FeatureVector, ExtractionError> {
        let identity = DomainIdentity::resolve(&url.host);
        info!("Extracting features for {} (domain: {:?})", url.original, identity.domain);

        let outcomes = self.run_probes(url, &identity).await;

        let mut builder = FeatureVectorBuilder::new();
        apply_lexical_signals(url, &identity, &mut builder);
        apply_probe_signals(&identity, &outcomes, &mut builder);

        for feature in Feature::PLACEHOLDERS {
            builder.set(feature, Signal::Neutral);
        }

        builder.build().map_err(|missing| ExtractionError::ExtractionFailure {
            url: url.original.clone(),
            reason: format!("unset signals: {}", missing.join(", ")),
        })
    }

    async fn run_probes(&self, url: &ValidatedUrl, identity: &DomainIdentity) -> ProbeOutcomes {
        let probes = self.probes.as_ref();

        let fetch = async {
            let result = probes.fetch(&url.original).await;
            log_outcome(
                ProbeKind::Fetch,
                &url.original,
                result.as_ref().map(|content| content.status),
            );
            result
        };

        let tls = async {
            if !url.is_https() {
                return None;
            }
            let result = probes.certificate_days(&identity.host).await;
            log_outcome(ProbeKind::Tls, &identity.host, result.as_ref());
            Some(result)
        };

        let dns = async {
            let result = match domain_of(identity) {
                Ok(domain) => probes.resolve_address(domain).await,
                Err(e) => Err(e),
            };
            log_outcome(ProbeKind::Dns, &identity.domain, result.as_ref());
            result
        };

        let whois = async {
            let result = match domain_of(identity) {
                Ok(domain) => probes.domain_age_days(domain).await,
                Err(e) => Err(e),
            };
            log_outcome(ProbeKind::Whois, &identity.domain, result.as_ref());
            result
        };

        let (content, certificate_days, address, age_days) = tokio::join!(fetch, tls, dns, whois);

        ProbeOutcomes {
            content,
            certificate_days,
            address,
            age_days,
        }
    }
}

fn domain_of(identity: &DomainIdentity) -> Result<&str, ProbeError> {
    if identity.has_domain() {
        Ok(identity.domain.as_str())
    } else {
        Err(ProbeError::InvalidInput(format!(
            "no registrable domain for {}",
            identity.host
        )))
    }
}

fn log_outcome<T: std::fmt::Debug>(kind: ProbeKind, target: &str, result: Result<T, &ProbeError>) {
    match result {
        Ok(value) => debug!(probe = %kind, "{} probe ok for {}: {:?}", kind, target, value),
        Err(e) if e.is_capability_gap() => debug!(probe = %kind, "{} probe skipped: {}", kind, e),
        Err(e) => warn!(probe = %kind, "{} probe failed for {}: {}", kind, target, e),
    }
}

// =============================================================================
// SIGNAL RULES
// =============================================================================

/// Signals computed from the URL string alone
pub fn apply_lexical_signals(
    url: &ValidatedUrl,
    identity: &DomainIdentity,
    builder: &mut FeatureVectorBuilder,
) {
    let host = url.host.to_ascii_lowercase();

    let length = url.original.chars().count();
    let url_length = if length < 54 {
        Signal::Legitimate
    } else if length <= 75 {
        Signal::Neutral
    } else {
        Signal::Suspicious
    };

    let sub_domain = match identity.subdomain_depth() {
        0 | 1 => Signal::Legitimate,
        2 => Signal::Neutral,
        _ => Signal::Suspicious,
    };

    let odd_port = url
        .port()
        .map(|port| !STANDARD_PORTS.contains(&port))
        .unwrap_or(false);

    builder
        .set(Feature::HavingIpAddress, Signal::flag(IPV4_HOST.is_match(&host)))
        .set(Feature::UrlLength, url_length)
        .set(Feature::ShortiningService, Signal::flag(is_shortener(&host)))
        .set(Feature::HavingAtSymbol, Signal::flag(url.original.contains('@')))
        .set(Feature::DoubleSlashRedirecting, Signal::flag(url.path.contains("//")))
        .set(Feature::PrefixSuffix, Signal::flag(host.contains('-')))
        .set(Feature::HavingSubDomain, sub_domain)
        .set(Feature::Port, Signal::flag(odd_port))
        .set(Feature::HttpsToken, Signal::flag(host.contains("https")))
        .set(
            Feature::AbnormalUrl,
            Signal::flag(!(identity.has_domain() && !url.scheme.is_empty())),
        );
}

/// Host is a shortener or a subdomain of one
pub fn is_shortener(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    SHORTENERS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{}", s)))
}

/// Probe outcomes to signals; every failure maps to its documented default
fn apply_probe_signals(
    identity: &DomainIdentity,
    outcomes: &ProbeOutcomes,
    builder: &mut FeatureVectorBuilder,
) {
    let ssl = match &outcomes.certificate_days {
        Some(Ok(days)) => classify_expiry(*days),
        Some(Err(_)) | None => Signal::Suspicious,
    };

    let age = match &outcomes.age_days {
        Ok(days) => classify_age(*days),
        Err(_) => Signal::Suspicious,
    };

    let dns = match &outcomes.address {
        Ok(()) => Signal::Legitimate,
        Err(_) => Signal::Suspicious,
    };

    let content = outcomes.content.as_ref().ok();
    let redirect = Signal::flag(content.map(RawContent::is_redirect).unwrap_or(false));

    builder
        .set(Feature::SslFinalState, ssl)
        .set(Feature::DomainRegisterationLength, age)
        .set(Feature::AgeOfDomain, age)
        .set(Feature::DnsRecord, dns)
        .set(Feature::Redirect, redirect);

    HtmlAnalyzer::analyze(identity, content).apply(builder);
}

// =============================================================================
// TESTS
// =============================================================================
