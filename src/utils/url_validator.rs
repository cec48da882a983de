// Syntactic URL acceptance before any network work
// Rules run in a fixed order and the first failure is reported

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// STATIC REGEX PATTERNS
// =============================================================================

lazy_static! {
    /// `scheme:rest`, scheme per RFC 3986
    static ref SCHEME_PATTERN: Regex =
        Regex::new(r"(?s)^([A-Za-z][A-Za-z0-9+.\-]*):(.*)$").expect("Invalid scheme pattern regex");

    /// Characters allowed in a host name
    static ref HOST_CHARS: Regex =
        Regex::new(r"^[a-zA-Z0-9.\-]+$").expect("Invalid host pattern regex");

    /// Top-level label: letters only, two or more
    static ref TLD_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z]{2,}$").expect("Invalid TLD pattern regex");
}

const MIN_URL_LENGTH: usize = 4;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("URL is too short")]
    TooShort,

    #[error("Missing protocol (http:// or https://)")]
    MissingScheme,

    #[error("Invalid protocol: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URL format. Missing domain")]
    MissingHost,

    #[error("Invalid domain. Must have at least one dot")]
    MissingDot,

    #[error("Invalid domain format")]
    MalformedDomain,

    #[error("Domain contains invalid characters")]
    InvalidCharacters,

    #[error("Invalid domain structure")]
    EmptyLabel,

    #[error("Invalid TLD: .{0}")]
    InvalidTld(String),
}

impl ValidationError {
    /// Stable identifier of the rule that rejected the URL
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::TooShort => "min_length",
            ValidationError::MissingScheme => "scheme_present",
            ValidationError::UnsupportedScheme(_) => "scheme_http",
            ValidationError::MissingHost => "host_present",
            ValidationError::MissingDot | ValidationError::MalformedDomain => "host_dots",
            ValidationError::InvalidCharacters => "host_charset",
            ValidationError::EmptyLabel => "host_labels",
            ValidationError::InvalidTld(_) => "tld",
        }
    }
}

// =============================================================================
// DATA STRUCTURES
// =============================================================================

/// A URL that passed every rule, split into the raw pieces the lexical
/// signals look at. Nothing here is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedUrl {
    pub original: String,
    pub scheme: String,
    pub netloc: String,
    pub host: String,
    pub path: String,
}

impl ValidatedUrl {
    /// Explicit port from the network location, if one was given
    pub fn port(&self) -> Option<&str> {
        self.netloc.rsplit_once(':').map(|(_, port)| port)
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }
}

// =============================================================================
// URL VALIDATOR
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl UrlValidator {
    pub fn new() -> Self {
        Self
    }

    /// Apply every rule in order; the first failing rule is returned
    pub fn validate(&self, url_str: &str) -> Result<ValidatedUrl, ValidationError> {
        // 1. Length
        if url_str.chars().count() < MIN_URL_LENGTH {
            return Err(ValidationError::TooShort);
        }

        // 2. Scheme
        let captures = SCHEME_PATTERN
            .captures(url_str)
            .ok_or(ValidationError::MissingScheme)?;
        let scheme = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .ok_or(ValidationError::MissingScheme)?;
        let rest = captures.get(2).map(|m| m.as_str()).unwrap_or("");

        if scheme != "http" && scheme != "https" {
            return Err(ValidationError::UnsupportedScheme(scheme));
        }

        // 3. Network location
        let (netloc, path) = split_authority(rest);
        if netloc.is_empty() {
            return Err(ValidationError::MissingHost);
        }

        // 4. Dots
        let host = netloc.split(':').next().unwrap_or("");
        if host.is_empty() || !host.contains('.') {
            return Err(ValidationError::MissingDot);
        }
        if host.starts_with('.') || host.ends_with('.') || host.contains("..") {
            return Err(ValidationError::MalformedDomain);
        }

        // 5. Character class
        if !HOST_CHARS.is_match(host) {
            return Err(ValidationError::InvalidCharacters);
        }

        // 6. Labels
        let labels: Vec<&str> = host.split('.').collect();
        if labels.iter().any(|label| label.is_empty()) {
            return Err(ValidationError::EmptyLabel);
        }

        // 7. TLD
        let tld = labels.last().copied().unwrap_or("");
        if !TLD_PATTERN.is_match(tld) {
            return Err(ValidationError::InvalidTld(tld.to_string()));
        }

        Ok(ValidatedUrl {
            original: url_str.to_string(),
            scheme,
            netloc: netloc.to_string(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}

/// Split the part after `scheme:` into (netloc, path). Without a leading `//`
/// there is no network location.
fn split_authority(rest: &str) -> (&str, &str) {
    let Some(after) = rest.strip_prefix("//") else {
        return ("", strip_query(rest));
    };

    let end = after.find(['/', '?', '#']).unwrap_or(after.len());
    let (netloc, remainder) = after.split_at(end);
    (netloc, strip_query(remainder))
}

fn strip_query(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

/// Trim caller input and coerce a bare host such as `example.com` into
/// `http://example.com`. Blank input yields `None`.
pub fn normalize_input(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.contains("//") && trimmed.contains('.') {
        Some(format!("http://{}", trimmed))
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(url: &str) -> Result<ValidatedUrl, ValidationError> {
        UrlValidator::new().validate(url)
    }

    #[test]
    fn test_valid_urls() {
        let valid_urls = vec![
            "https://example.com",
            "http://subdomain.example.com/path",
            "https://example.com:8080/path?query=value",
            "https://example.com/path#fragment",
            "http://shop.example.co.uk//redirect",
        ];

        for url_str in valid_urls {
            assert!(validate(url_str).is_ok(), "Should be valid: {}", url_str);
        }
    }

    #[test]
    fn test_components() {
        let url = validate("https://login.example.com:8443/a//b?x=1#top").unwrap();
        assert_eq!(url.scheme, "https");
        assert_eq!(url.netloc, "login.example.com:8443");
        assert_eq!(url.host, "login.example.com");
        assert_eq!(url.path, "/a//b");
        assert_eq!(url.port(), Some("8443"));
        assert!(url.is_https());
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(validate("a:b"), Err(ValidationError::TooShort));
        assert_eq!(validate("not-a-url"), Err(ValidationError::MissingScheme));
        assert_eq!(validate("not a url"), Err(ValidationError::MissingScheme));
        assert_eq!(
            validate("ftp://example.com"),
            Err(ValidationError::UnsupportedScheme("ftp".to_string()))
        );
        assert_eq!(validate("http:example.com"), Err(ValidationError::MissingHost));
        assert_eq!(validate("http:///path"), Err(ValidationError::MissingHost));
        assert_eq!(validate("http://localhost"), Err(ValidationError::MissingDot));
        assert_eq!(validate("http://.example.com"), Err(ValidationError::MalformedDomain));
        assert_eq!(validate("http://example..com"), Err(ValidationError::MalformedDomain));
        assert_eq!(validate("http://exa_mple.com"), Err(ValidationError::InvalidCharacters));
        assert_eq!(
            validate("http://user@example.com"),
            Err(ValidationError::InvalidCharacters)
        );
        assert_eq!(
            validate("http://192.168.1.1"),
            Err(ValidationError::InvalidTld("1".to_string()))
        );
        assert_eq!(
            validate("http://example.c"),
            Err(ValidationError::InvalidTld("c".to_string()))
        );
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let url = validate("HTTPS://EXAMPLE.COM").unwrap();
        assert_eq!(url.scheme, "https");
        assert_eq!(url.host, "EXAMPLE.COM");
    }

    #[test]
    fn test_error_rules_are_named() {
        assert_eq!(ValidationError::MissingScheme.rule(), "scheme_present");
        assert_eq!(ValidationError::InvalidTld("x".into()).rule(), "tld");
        assert_eq!(
            ValidationError::UnsupportedScheme("ftp".into()).to_string(),
            "Invalid protocol: ftp"
        );
    }

    #[test]
    fn test_normalize_input() {
        assert_eq!(
            normalize_input("  example.com "),
            Some("http://example.com".to_string())
        );
        assert_eq!(
            normalize_input("https://example.com"),
            Some("https://example.com".to_string())
        );
        assert_eq!(normalize_input("not a url"), Some("not a url".to_string()));
        assert_eq!(normalize_input("   "), None);
    }
}
