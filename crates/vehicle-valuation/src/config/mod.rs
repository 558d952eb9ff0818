use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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

/// Top-level configuration for the valuation service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub valuation: ValuationSettings,
    pub rate_limit: RateLimitSettings,
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

        let reference_year = match env::var("VALUATION_REFERENCE_YEAR") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .ok()
                    .filter(|year| (1900..=9999).contains(year))
                    .ok_or(ConfigError::InvalidReferenceYear(raw))?,
            ),
            Err(_) => None,
        };

        let price_spread = match env::var("VALUATION_PRICE_SPREAD") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|spread| (0.0..=0.5).contains(spread))
                .ok_or(ConfigError::InvalidPriceSpread(raw))?,
            Err(_) => ValuationSettings::DEFAULT_PRICE_SPREAD,
        };

        let max_requests = parse_positive("VALUATION_RATE_LIMIT_MAX", 30)?;
        let window_secs = parse_positive("VALUATION_RATE_LIMIT_WINDOW_SECS", 60)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            valuation: ValuationSettings {
                reference_year,
                price_spread,
            },
            rate_limit: RateLimitSettings {
                max_requests: max_requests as u32,
                window_secs,
            },
        })
    }
}

fn parse_positive(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0 && *value <= u32::MAX as u64)
            .ok_or(ConfigError::InvalidRateLimit { key, value: raw }),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Pricing knobs exposed to operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSettings {
    /// Pins the valuation year; the current calendar year when unset.
    pub reference_year: Option<i32>,
    pub price_spread: f64,
}

impl ValuationSettings {
    pub const DEFAULT_PRICE_SPREAD: f64 = 0.05;
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            reference_year: None,
            price_spread: Self::DEFAULT_PRICE_SPREAD,
        }
    }
}

/// Per-client request budget handed to the rate limiter adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidReferenceYear(String),
    InvalidPriceSpread(String),
    InvalidRateLimit { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidReferenceYear(raw) => write!(
                f,
                "VALUATION_REFERENCE_YEAR must be a four-digit year (got '{raw}')"
            ),
            ConfigError::InvalidPriceSpread(raw) => write!(
                f,
                "VALUATION_PRICE_SPREAD must be a fraction between 0 and 0.5 (got '{raw}')"
            ),
            ConfigError::InvalidRateLimit { key, value } => {
                write!(f, "{key} must be a positive integer (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
