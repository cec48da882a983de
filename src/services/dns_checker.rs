// Address-record presence probe

use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::ResolveErrorKind,
    system_conf, TokioAsyncResolver,
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::probe::ProbeError;

pub struct DnsChecker {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsChecker {
    /// Resolver from the system configuration, one attempt per query.
    /// Falls back to the library default servers when the system config
    /// cannot be read.
    pub fn new(lookup_timeout: Duration) -> Self {
        let (config, mut opts) = match system_conf::read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                warn!("Could not read system DNS config, using defaults: {}", e);
                (ResolverConfig::default(), ResolverOpts::default())
            },
        };

        opts.timeout = lookup_timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout: lookup_timeout,
        }
    }

    /// `Ok(())` when at least one A record exists for `domain`
    pub async fn has_address(&self, domain: &str) -> Result<(), ProbeError> {
        if domain.is_empty() {
            return Err(ProbeError::InvalidInput("empty domain".to_string()));
        }

        let lookup = timeout(self.timeout, self.resolver.ipv4_lookup(domain))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout.as_secs()))?;

        match lookup {
            Ok(records) if records.iter().next().is_some() => {
                debug!("DNS A record present for {}", domain);
                Ok(())
            },
            Ok(_) => Err(ProbeError::NotFound(format!("no A record for {}", domain))),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    Err(ProbeError::NotFound(format!("no A record for {}", domain)))
                },
                ResolveErrorKind::Timeout => Err(ProbeError::Timeout(self.timeout.as_secs())),
                _ => Err(ProbeError::Network(e.to_string())),
            },
        }
    }
}
