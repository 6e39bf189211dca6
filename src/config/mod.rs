use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

use crate::cache::DEFAULT_TTL_SECS;

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

/// Top-level configuration for the job board.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub policy: PolicyConfig,
    pub sweep: SweepConfig,
}

impl AppConfig {
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let cache_ttl_secs = read_number("APP_CACHE_TTL_SECS", DEFAULT_TTL_SECS as u64)?;
        let invalidate_on_write = read_flag("APP_CACHE_INVALIDATE_ON_WRITE", true)?;
        let rate_limit_hours = read_number("APP_RATE_LIMIT_HOURS", 24)?;
        let enforce_capacity = read_flag("APP_ENFORCE_CAPACITY", true)?;
        let sweep_interval_secs = read_number("APP_SWEEP_INTERVAL_SECS", 3600)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            policy: PolicyConfig {
                cache_ttl_secs,
                invalidate_on_write,
                rate_limit_hours,
                enforce_capacity,
            },
            sweep: SweepConfig {
                interval_secs: sweep_interval_secs,
            },
        })
    }
}

fn read_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn read_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key }),
        },
        Err(_) => Ok(default),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

// Ten years; keeps `now + window` far from the chrono range limits.
const MAX_WINDOW_SECS: i64 = 10 * 365 * 24 * 3600;

/// Admission and caching knobs shared by the application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub cache_ttl_secs: u64,
    pub invalidate_on_write: bool,
    pub rate_limit_hours: u64,
    pub enforce_capacity: bool,
}

impl PolicyConfig {
    pub fn cache_ttl(&self) -> Duration {
        let secs = i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(MAX_WINDOW_SECS))
    }

    pub fn rate_limit_window(&self) -> Duration {
        let hours = i64::try_from(self.rate_limit_hours).unwrap_or(i64::MAX);
        Duration::seconds(hours.min(MAX_WINDOW_SECS / 3600) * 3600)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL_SECS as u64,
            invalidate_on_write: true,
            rate_limit_hours: 24,
            enforce_capacity: true,
        }
    }
}

/// Expiry sweep scheduling. An interval of zero disables the periodic task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub interval_secs: u64,
}

impl SweepConfig {
    pub fn interval(&self) -> Option<std::time::Duration> {
        (self.interval_secs > 0).then(|| std::time::Duration::from_secs(self.interval_secs))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
