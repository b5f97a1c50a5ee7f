use crate::error::{CheckerError, Result};
use std::env;
use std::time::Duration;

/// Browser-like user agent sent with probe requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiServerConfig,
    /// Probe configuration
    pub probe: ProbeConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the API server (default: 8000)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Allowed CORS origins (comma-separated, empty = any origin)
    pub cors_origins: Vec<String>,
    /// Whole-request timeout in seconds
    pub request_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Host requested through the candidate proxy, also used as TLS SNI
    pub target_host: String,
    /// Path requested on the target host
    pub target_path: String,
    /// Upper bound for a single probe in milliseconds
    pub timeout_ms: u64,
    /// User-Agent header sent with the probe request
    pub user_agent: String,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_host: "speed.cloudflare.com".to_string(),
            target_path: "/meta".to_string(),
            timeout_ms: 3000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl LogConfig {
    /// Load logging configuration alone; does not validate the rest of `Config`
    pub fn from_env() -> Self {
        Self {
            level: get_env_or("LOG_LEVEL", "info"),
            format: get_env_or("LOG_FORMAT", "pretty"),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let timeout_ms: u64 = get_env_or("PROBE_TIMEOUT_MS", "3000").parse().map_err(|_| {
            CheckerError::InvalidConfig("PROBE_TIMEOUT_MS must be a number of milliseconds".into())
        })?;
        if timeout_ms == 0 {
            return Err(CheckerError::InvalidConfig(
                "PROBE_TIMEOUT_MS must be greater than zero".into(),
            ));
        }

        let target_path = get_env_or("PROBE_TARGET_PATH", "/meta");
        if !target_path.starts_with('/') {
            return Err(CheckerError::InvalidConfig(
                "PROBE_TARGET_PATH must start with '/'".into(),
            ));
        }

        Ok(Config {
            api: ApiServerConfig {
                port: get_env_or("API_PORT", "8000").parse().map_err(|_| {
                    CheckerError::InvalidConfig("API_PORT must be a valid port number".into())
                })?,
                host: get_env_or("API_HOST", "0.0.0.0"),
                cors_origins: get_env_or("CORS_ORIGINS", "")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                request_timeout: get_env_or("API_REQUEST_TIMEOUT", "10")
                    .parse()
                    .unwrap_or(10),
            },
            probe: ProbeConfig {
                target_host: get_env_or("PROBE_TARGET_HOST", "speed.cloudflare.com"),
                target_path,
                timeout_ms,
                user_agent: get_env_or("PROBE_USER_AGENT", DEFAULT_USER_AGENT),
            },
            log: LogConfig::from_env(),
        })
    }

    /// Get the API server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
