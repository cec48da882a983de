// Certificate expiry probe: TCP connect + verified TLS handshake to host:443

use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use tokio_native_tls::{native_tls, TlsConnector};
use tracing::debug;

use crate::models::{features::Signal, probe::ProbeError};

const TLS_PORT: u16 = 443;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct SslInspector {
    handshake_timeout: Duration,
}

impl SslInspector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }

    /// Whole days until the leaf certificate expires (negative once expired).
    /// The timeout covers both the TCP connect and the handshake.
    pub async fn days_until_expiry(&self, host: &str) -> Result<i64, ProbeError> {
        if host.is_empty() {
            return Err(ProbeError::InvalidInput("empty host".to_string()));
        }

        let not_after = timeout(self.handshake_timeout, self.peer_not_after(host))
            .await
            .map_err(|_| ProbeError::Timeout(self.handshake_timeout.as_secs()))??;

        let days = days_between(not_after, chrono::Utc::now().timestamp());
        debug!("Certificate for {} expires in {} days", host, days);
        Ok(days)
    }

    async fn peer_not_after(&self, host: &str) -> Result<i64, ProbeError> {
        let tcp = TcpStream::connect((host, TLS_PORT)).await?;

        let connector = native_tls::TlsConnector::new()
            .map_err(|e| ProbeError::Tls(e.to_string()))?;
        let connector = TlsConnector::from(connector);

        let stream = connector
            .connect(host, tcp)
            .await
            .map_err(|e| ProbeError::Tls(e.to_string()))?;

        let der = stream
            .get_ref()
            .peer_certificate()
            .map_err(|e| ProbeError::Tls(e.to_string()))?
            .ok_or_else(|| ProbeError::Tls("server sent no certificate".to_string()))?
            .to_der()
            .map_err(|e| ProbeError::Parse(e.to_string()))?;

        not_after_timestamp(&der)
    }
}

/// `notAfter` of a DER certificate as a Unix timestamp
pub fn not_after_timestamp(der: &[u8]) -> Result<i64, ProbeError> {
    let (_, certificate) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| ProbeError::Parse(format!("invalid certificate: {}", e)))?;
    Ok(certificate.validity().not_after.timestamp())
}

/// Floor of the day difference, so 23h59m left counts as 0 days
pub fn days_between(not_after: i64, now: i64) -> i64 {
    (not_after - now).div_euclid(SECONDS_PER_DAY)
}

/// More than a year left is legitimate, more than a month neutral
pub fn classify_expiry(days: i64) -> Signal {
    if days > 365 {
        Signal::Legitimate
    } else if days > 30 {
        Signal::Neutral
    } else {
        Signal::Suspicious
    }
}
