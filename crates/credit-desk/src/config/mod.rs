use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the desk and its HTTP surface.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
}

impl DeskConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("CREDIT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let submit_timeout =
            seconds_from_env("CREDIT_SUBMIT_TIMEOUT_SECS", DEFAULT_SUBMIT_TIMEOUT_SECS)?;
        let health_interval =
            seconds_from_env("CREDIT_HEALTH_INTERVAL_SECS", DEFAULT_HEALTH_INTERVAL_SECS)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            backend: BackendConfig::new(base_url, submit_timeout, health_interval)?,
        })
    }
}

fn seconds_from_env(variable: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidDuration { variable }),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the scoring service lives and how long we wait on it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub submit_timeout: Duration,
    pub health_interval: Duration,
}

impl BackendConfig {
    pub fn new(
        base_url: impl Into<String>,
        submit_timeout: Duration,
        health_interval: Duration,
    ) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            submit_timeout,
            health_interval,
        })
    }

    /// Replace the base URL, keeping the timing settings.
    pub fn with_base_url(self, base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..self
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|_| ConfigError::InvalidBackendUrl {
        value: raw.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBackendUrl {
            value: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBackendUrl { value: String },
    InvalidDuration { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBackendUrl { value } => {
                write!(f, "CREDIT_API_URL must be an absolute http(s) URL, got '{value}'")
            }
            ConfigError::InvalidDuration { variable } => {
                write!(f, "{variable} must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBackendUrl { .. }
            | ConfigError::InvalidDuration { .. } => None,
        }
    }
}
