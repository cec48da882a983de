// Public-suffix-aware host decomposition

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::net::IpAddr;

lazy_static! {
    /// Authority of an absolute (`scheme://`) or protocol-relative (`//`) reference
    static ref AUTHORITY_PATTERN: Regex =
        Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?//([^/?#\\]*)")
            .expect("Invalid authority pattern regex");
}

/// Registrable domain and subdomain of one host.
///
/// `domain` is empty when the host has no registrable part (empty host, an
/// unknown suffix, or a bare suffix such as `co.uk`). An empty domain is never
/// considered equal to anything, including another empty domain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DomainIdentity {
    pub host: String,
    pub domain: String,
    pub subdomain: String,
}

impl DomainIdentity {
    pub fn resolve(host: &str) -> Self {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        let domain = registrable_domain(&host);

        let subdomain = if domain.is_empty() {
            unlisted_subdomain(&host)
        } else if host == domain {
            String::new()
        } else {
            host.strip_suffix(&domain)
                .and_then(|prefix| prefix.strip_suffix('.'))
                .unwrap_or("")
                .to_string()
        };

        Self {
            host,
            domain,
            subdomain,
        }
    }

    pub fn has_domain(&self) -> bool {
        !self.domain.is_empty()
    }

    /// Number of dot-separated subdomain labels (`a.b.example.com` has 2)
    pub fn subdomain_depth(&self) -> usize {
        if self.subdomain.is_empty() {
            0
        } else {
            self.subdomain.split('.').count()
        }
    }

    /// True only when both sides have a registrable domain and they match
    pub fn same_site(&self, other_host: &str) -> bool {
        if self.domain.is_empty() {
            return false;
        }
        registrable_domain(other_host) == self.domain
    }
}

/// Registrable domain for a host, or an empty string when there is none
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return String::new();
    }

    match psl::domain(host.as_bytes()) {
        Some(domain) if domain.suffix().is_known() => std::str::from_utf8(domain.as_bytes())
            .map(str::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Subdomain of a host whose suffix is not on the public suffix list: the last
/// label is taken as the domain and everything before it as the subdomain.
/// IP literals and bare listed suffixes have none.
fn unlisted_subdomain(host: &str) -> String {
    if host.trim_matches(['[', ']']).parse::<IpAddr>().is_ok() {
        return String::new();
    }

    match psl::suffix(host.as_bytes()) {
        Some(suffix) if !suffix.is_known() => host
            .rsplit_once('.')
            .map(|(prefix, _)| prefix.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Host named by a markup reference, if the reference carries an authority.
/// Relative paths, fragments and `javascript:`/`mailto:` references yield `None`.
pub fn link_host(reference: &str) -> Option<String> {
    let captures = AUTHORITY_PATTERN.captures(reference.trim())?;
    let authority = captures.get(1)?.as_str();

    // Drop userinfo, then the port
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = if let Some(bracketed) = host_port.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or("")
    } else {
        host_port.split(':').next().unwrap_or("")
    };

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
