// Probe outcomes: every network check returns Result<T, ProbeError>
// and the assembler decides what a failure means for the vector

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which external check produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Fetch,
    Tls,
    Dns,
    Whois,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Fetch => write!(f, "fetch"),
            ProbeKind::Tls => write!(f, "tls"),
            ProbeKind::Dns => write!(f, "dns"),
            ProbeKind::Whois => write!(f, "whois"),
        }
    }
}

/// Why a probe could not produce a value.
///
/// `Disabled` means there was no capability to check at all (offline mode);
/// every other variant means the check ran and failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("network probes are disabled")]
    Disabled,

    #[error("invalid probe input: {0}")]
    InvalidInput(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("response body is not decodable: {0}")]
    Decode(String),

    #[error("no record found: {0}")]
    NotFound(String),
}

impl ProbeError {
    /// True when the probe never attempted the check
    pub fn is_capability_gap(&self) -> bool {
        matches!(self, ProbeError::Disabled)
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Network(format!("request timed out: {}", err))
        } else {
            ProbeError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Network(err.to_string())
    }
}

/// Snapshot of one fetched page. The body is already capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    pub status: u16,
    pub body: String,
    pub final_url: String,
    pub truncated: bool,
}

impl RawContent {
    /// HTML signals only run on a successful, non-empty page
    pub fn is_analyzable(&self) -> bool {
        self.status == 200 && !self.body.is_empty()
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}
