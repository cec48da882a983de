// Domain age from plain WHOIS (TCP port 43)
// Server choice: built-in TLD table, then IANA referral; one registrar hop

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::{collections::HashMap, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, warn};

use crate::models::{features::Signal, probe::ProbeError};

// =============================================================================
// CONSTANTS
// =============================================================================

const WHOIS_PORT: u16 = 43;

/// Hard cap on a single WHOIS answer
const MAX_RESPONSE_BYTES: u64 = 64 * 1024;

static WHOIS_SERVERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("com", "whois.verisign-grs.com"),
        ("net", "whois.verisign-grs.com"),
        ("org", "whois.pir.org"),
        ("info", "whois.nic.info"),
        ("biz", "whois.nic.biz"),
        ("us", "whois.nic.us"),
        ("co", "whois.nic.co"),
        ("io", "whois.nic.io"),
        ("me", "whois.nic.me"),
        ("uk", "whois.nic.uk"),
        ("ca", "whois.cira.ca"),
        ("de", "whois.denic.de"),
        ("fr", "whois.nic.fr"),
        ("ru", "whois.tcinet.ru"),
        ("cn", "whois.cnnic.cn"),
        ("jp", "whois.jprs.jp"),
        ("au", "whois.auda.org.au"),
        ("br", "whois.registro.br"),
        ("in", "whois.registry.in"),
        ("xyz", "whois.nic.xyz"),
        ("top", "whois.nic.top"),
        ("app", "whois.nic.google"),
        ("dev", "whois.nic.google"),
        ("tech", "whois.nic.tech"),
    ])
});

/// Line prefixes (lower-cased) that carry the registration date
const CREATION_KEYS: [&str; 10] = [
    "creation date:",
    "created:",
    "created on:",
    "created date:",
    "registered on:",
    "registered:",
    "registration time:",
    "registration date:",
    "domain registration date:",
    "domain name commencement date:",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%b-%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%Y%m%d",
];

// =============================================================================
// WHOIS AGENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct WhoisAgent {
    timeout: Duration,
    iana_server: String,
    port: u16,
}

impl WhoisAgent {
    /// `timeout` bounds the whole lookup, every server hop included
    pub fn new(timeout: Duration, iana_server: impl Into<String>) -> Self {
        Self {
            timeout,
            iana_server: iana_server.into(),
            port: WHOIS_PORT,
        }
    }

    /// Query servers on a different port (local test servers)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Whole days since the domain's creation date
    pub async fn domain_age_days(&self, domain: &str) -> Result<i64, ProbeError> {
        let created = self.creation_date(domain).await?;
        let age = (Utc::now() - created).num_days();
        debug!("WHOIS: {} created {} ({} days)", domain, created, age);
        Ok(age)
    }

    pub async fn creation_date(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return Err(ProbeError::InvalidInput("empty domain".to_string()));
        }

        timeout(self.timeout, self.lookup(&domain))
            .await
            .map_err(|_| {
                warn!("WHOIS lookup for {} exceeded {:?}", domain, self.timeout);
                ProbeError::Timeout(self.timeout.as_secs())
            })?
    }

    async fn lookup(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError> {
        let tld = domain.rsplit('.').next().unwrap_or("");
        let server = self.server_for(tld).await?;
        let registry_answer = self.query(&server, domain).await?;

        // Thin registries point at the registrar's server; follow that once
        if let Some(referral) = parse_referral(&registry_answer, "registrar whois server:") {
            if !referral.eq_ignore_ascii_case(&server) {
                match self.query(&referral, domain).await {
                    Ok(answer) => {
                        if let Some(created) = parse_creation_date(&answer) {
                            return Ok(created);
                        }
                    },
                    Err(e) => warn!("WHOIS referral to {} failed: {}", referral, e),
                }
            }
        }

        parse_creation_date(&registry_answer)
            .ok_or_else(|| ProbeError::NotFound(format!("no creation date for {}", domain)))
    }

    async fn server_for(&self, tld: &str) -> Result<String, ProbeError> {
        if let Some(server) = WHOIS_SERVERS.get(tld) {
            return Ok((*server).to_string());
        }

        let answer = self.query(&self.iana_server, tld).await?;
        parse_referral(&answer, "refer:")
            .or_else(|| parse_referral(&answer, "whois:"))
            .ok_or_else(|| ProbeError::NotFound(format!("no WHOIS server for .{}", tld)))
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, ProbeError> {
        let mut stream = TcpStream::connect((server, self.port)).await?;
        stream.write_all(format!("{}\r\n", query).as_bytes()).await?;

        let mut response = Vec::new();
        (&mut stream)
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut response)
            .await?;

        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Server named on the first line starting with `key` (case-insensitive).
/// URL-style values such as `whois://whois.example.net/` are reduced to the host.
pub fn parse_referral(answer: &str, key: &str) -> Option<String> {
    answer.lines().find_map(|line| {
        let line = line.trim();
        let lower = line.to_ascii_lowercase();
        if !lower.starts_with(key) {
            return None;
        }

        let value = line[key.len()..].trim();
        let value = value.split("://").last().unwrap_or(value);
        let host = value.split(['/', ' ']).next().unwrap_or("").trim();

        if host.is_empty() {
            None
        } else {
            Some(host.to_ascii_lowercase())
        }
    })
}

/// First parseable creation date in a WHOIS answer
pub fn parse_creation_date(answer: &str) -> Option<DateTime<Utc>> {
    answer.lines().find_map(|line| {
        let line = line.trim();
        let lower = line.to_ascii_lowercase();
        let key = CREATION_KEYS.iter().find(|key| lower.starts_with(*key))?;
        parse_date_value(line[key.len()..].trim())
    })
}

fn parse_date_value(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    // Dates followed by a zone or comment, e.g. "2001-01-01 (UTC)"
    let first_token = value.split_whitespace().next().unwrap_or(value);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(first_token) {
        return Some(parsed.with_timezone(&Utc));
    }

    for candidate in [value, first_token] {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return date
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| Utc.from_utc_datetime(&naive));
            }
        }
    }

    None
}

/// One year or older is legitimate, six months neutral, younger suspicious
pub fn classify_age(days: i64) -> Signal {
    if days >= 365 {
        Signal::Legitimate
    } else if days >= 180 {
        Signal::Neutral
    } else {
        Signal::Suspicious
    }
}

// =============================================================================
// TESTS
// =============================================================================
