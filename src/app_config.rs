// Centralized configuration for the extraction service
// Every knob has a default; values are read once at startup

use serde::{Deserialize, Serialize};
use std::{env, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Desktop browser identity sent with page fetches
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub probes: ProbeConfig,
    pub batch: BatchConfig,
    pub classifier: ClassifierConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
    pub rust_log: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Network probe budgets. Timeouts are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub enabled: bool,
    pub fetch_timeout: u64,
    pub fetch_max_body_bytes: usize,
    pub fetch_max_redirects: usize,
    pub fetch_user_agent: String,
    pub tls_handshake_timeout: u64,
    pub dns_timeout: u64,
    pub whois_timeout: u64,
    pub whois_iana_server: String,
    pub extraction_deadline: u64,
}

impl ProbeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_handshake_timeout)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout)
    }

    pub fn extraction_deadline(&self) -> Duration {
        Duration::from_secs(self.extraction_deadline)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout: 10,
            fetch_max_body_bytes: 100_000,
            fetch_max_redirects: 10,
            fetch_user_agent: DEFAULT_USER_AGENT.to_string(),
            tls_handshake_timeout: 5,
            dns_timeout: 5,
            whois_timeout: 10,
            whois_iana_server: "whois.iana.org".to_string(),
            extraction_deadline: 30,
        }
    }
}

/// Batch fan-out limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_concurrency: usize,
    pub max_urls: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            max_urls: 500,
        }
    }
}

/// External model endpoint. `endpoint_url` of `None` means predictions are disabled.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    pub endpoint_url: Option<String>,
    pub timeout: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_usize_or_default = |key: &str, default: &str| -> Result<usize, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid usize".to_string())
            })
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            get_or_default(key, default).to_lowercase() == "true"
        };

        // Parse bind address to extract port
        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:8080");
        let port = bind_address
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));
        let rust_log = get_or_default("RUST_LOG", "phishscan_core=debug,tower_http=info");
        let cors_allowed_origins: Vec<String> = get_or_default("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server = ServerConfig {
            bind_address,
            port,
            environment,
            rust_log,
            cors_allowed_origins,
        };

        let probes = ProbeConfig {
            enabled: parse_bool_or_default("ENABLE_NETWORK_PROBES", "true"),
            fetch_timeout: parse_u64_or_default("FETCH_TIMEOUT_SECS", "10")?,
            fetch_max_body_bytes: parse_usize_or_default("FETCH_MAX_BODY_BYTES", "100000")?,
            fetch_max_redirects: parse_usize_or_default("FETCH_MAX_REDIRECTS", "10")?,
            fetch_user_agent: get_or_default("FETCH_USER_AGENT", DEFAULT_USER_AGENT),
            tls_handshake_timeout: parse_u64_or_default("TLS_HANDSHAKE_TIMEOUT_SECS", "5")?,
            dns_timeout: parse_u64_or_default("DNS_TIMEOUT_SECS", "5")?,
            whois_timeout: parse_u64_or_default("WHOIS_TIMEOUT_SECS", "10")?,
            whois_iana_server: get_or_default("WHOIS_IANA_SERVER", "whois.iana.org"),
            extraction_deadline: parse_u64_or_default("EXTRACTION_DEADLINE_SECS", "30")?,
        };

        if probes.fetch_max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "FETCH_MAX_BODY_BYTES".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let batch = BatchConfig {
            max_concurrency: parse_usize_or_default("BATCH_MAX_CONCURRENCY", "16")?,
            max_urls: parse_usize_or_default("BATCH_MAX_URLS", "500")?,
        };

        if batch.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "BATCH_MAX_CONCURRENCY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let endpoint_url = env::var("MODEL_ENDPOINT_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(ref endpoint) = endpoint_url {
            url::Url::parse(endpoint).map_err(|e| {
                ConfigError::InvalidValue("MODEL_ENDPOINT_URL".to_string(), e.to_string())
            })?;
        }

        let classifier = ClassifierConfig {
            endpoint_url,
            timeout: parse_u64_or_default("MODEL_TIMEOUT_SECS", "10")?,
        };

        Ok(Self {
            server,
            probes,
            batch,
            classifier,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.server.environment == Environment::Development
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                port: 8080,
                environment: Environment::Development,
                rust_log: "phishscan_core=debug,tower_http=info".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            probes: ProbeConfig::default(),
            batch: BatchConfig::default(),
            classifier: ClassifierConfig {
                endpoint_url: None,
                timeout: 10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TOUCHED_VARS: [&str; 6] = [
        "FETCH_TIMEOUT_SECS",
        "BATCH_MAX_URLS",
        "ENABLE_NETWORK_PROBES",
        "MODEL_ENDPOINT_URL",
        "BATCH_MAX_CONCURRENCY",
        "ENVIRONMENT",
    ];

    fn clear_env() {
        for key in TOUCHED_VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(
            Environment::from("development".to_string()),
            Environment::Development
        );
        assert_eq!(
            Environment::from("prod".to_string()),
            Environment::Production
        );
        assert_eq!(Environment::from("test".to_string()), Environment::Test);
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = AppConfig::from_env().expect("Failed to load default config");

        assert!(config.probes.enabled);
        assert_eq!(config.probes.fetch_timeout, 10);
        assert_eq!(config.probes.fetch_max_body_bytes, 100_000);
        assert_eq!(config.probes.tls_handshake_timeout, 5);
        assert_eq!(config.probes.extraction_deadline, 30);
        assert_eq!(config.batch.max_urls, 500);
        assert!(config.classifier.endpoint_url.is_none());
    }

    #[test]
    #[serial]
    fn test_config_with_env() {
        clear_env();
        env::set_var("FETCH_TIMEOUT_SECS", "3");
        env::set_var("BATCH_MAX_URLS", "50");
        env::set_var("ENABLE_NETWORK_PROBES", "false");
        env::set_var("MODEL_ENDPOINT_URL", "http://127.0.0.1:9000/predict");
        env::set_var("ENVIRONMENT", "production");

        let config = AppConfig::from_env().expect("Failed to load test config");

        assert_eq!(config.probes.fetch_timeout(), Duration::from_secs(3));
        assert_eq!(config.batch.max_urls, 50);
        assert!(!config.probes.enabled);
        assert_eq!(
            config.classifier.endpoint_url.as_deref(),
            Some("http://127.0.0.1:9000/predict")
        );
        assert!(config.is_production());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        env::set_var("FETCH_TIMEOUT_SECS", "ten");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::InvalidValue(key, _)) if key == "FETCH_TIMEOUT_SECS"
        ));

        clear_env();
        env::set_var("BATCH_MAX_CONCURRENCY", "0");
        assert!(AppConfig::from_env().is_err());

        clear_env();
        env::set_var("MODEL_ENDPOINT_URL", "not a url");
        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}
