// Network probe seam used by the feature assembler

use async_trait::async_trait;

use crate::{
    app_config::ProbeConfig,
    models::probe::{ProbeError, RawContent},
    services::{
        content_fetcher::ContentFetcher, dns_checker::DnsChecker, ssl_inspector::SslInspector,
        whois_agent::WhoisAgent,
    },
};

/// The four external checks. Implementations report failures as
/// `ProbeError`; they never choose a fallback signal themselves.
#[async_trait]
pub trait NetworkProbes: Send + Sync {
    /// One GET of the page, body capped
    async fn fetch(&self, url: &str) -> Result<RawContent, ProbeError>;
    /// Days until the host's TLS certificate expires
    async fn certificate_days(&self, host: &str) -> Result<i64, ProbeError>;
    /// `Ok(())` when the domain has an address record
    async fn resolve_address(&self, domain: &str) -> Result<(), ProbeError>;
    /// Days since the domain was registered
    async fn domain_age_days(&self, domain: &str) -> Result<i64, ProbeError>;
}

/// Probes that talk to the real network
pub struct LiveProbes {
    fetcher: ContentFetcher,
    ssl: SslInspector,
    dns: DnsChecker,
    whois: WhoisAgent,
}

impl LiveProbes {
    pub fn from_config(config: &ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            fetcher: ContentFetcher::new(config)?,
            ssl: SslInspector::new(config.tls_handshake_timeout()),
            dns: DnsChecker::new(config.dns_timeout()),
            whois: WhoisAgent::new(config.whois_timeout(), config.whois_iana_server.clone()),
        })
    }
}

#[async_trait]
impl NetworkProbes for LiveProbes {
    async fn fetch(&self, url: &str) -> Result<RawContent, ProbeError> {
        self.fetcher.fetch(url).await
    }

    async fn certificate_days(&self, host: &str) -> Result<i64, ProbeError> {
        self.ssl.days_until_expiry(host).await
    }

    async fn resolve_address(&self, domain: &str) -> Result<(), ProbeError> {
        self.dns.has_address(domain).await
    }

    async fn domain_age_days(&self, domain: &str) -> Result<i64, ProbeError> {
        self.whois.domain_age_days(domain).await
    }
}

/// Used when network probing is switched off. Every check reports
/// `Disabled`, so only lexical signals carry information.
pub struct OfflineProbes;

#[async_trait]
impl NetworkProbes for OfflineProbes {
    async fn fetch(&self, _url: &str) -> Result<RawContent, ProbeError> {
        Err(ProbeError::Disabled)
    }

    async fn certificate_days(&self, _host: &str) -> Result<i64, ProbeError> {
        Err(ProbeError::Disabled)
    }

    async fn resolve_address(&self, _domain: &str) -> Result<(), ProbeError> {
        Err(ProbeError::Disabled)
    }

    async fn domain_age_days(&self, _domain: &str) -> Result<i64, ProbeError> {
        Err(ProbeError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_probes_report_disabled() {
        let probes = OfflineProbes;
        assert_eq!(probes.fetch("http://example.com").await, Err(ProbeError::Disabled));
        assert_eq!(probes.certificate_days("example.com").await, Err(ProbeError::Disabled));
        assert_eq!(probes.resolve_address("example.com").await, Err(ProbeError::Disabled));
        assert_eq!(probes.domain_age_days("example.com").await, Err(ProbeError::Disabled));
    }
}
