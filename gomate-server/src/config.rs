//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{AuthClientConfig, DEFAULT_AUTH_BASE_URL};
use crate::booking::{BookingConfig, DEFAULT_LATENCY};
use crate::cache::CacheConfig;
use crate::transport::{DEFAULT_BASE_URL, TransportApiConfig};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Directory for persisted JSON blobs
    pub data_dir: PathBuf,
    pub transport: TransportApiConfig,
    pub auth: AuthClientConfig,
    pub booking: BookingConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`. Unset or blank variables
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind = match var("GOMATE_BIND") {
            Some(value) => parse("GOMATE_BIND", value)?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let data_dir = var("GOMATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let timeout_secs = match var("GOMATE_HTTP_TIMEOUT_SECS") {
            Some(value) => parse("GOMATE_HTTP_TIMEOUT_SECS", value)?,
            None => 30,
        };

        let mock_fallback = match var("GOMATE_MOCK_FALLBACK") {
            Some(value) => parse_bool("GOMATE_MOCK_FALLBACK", value)?,
            None => true,
        };

        let mut transport = TransportApiConfig::new()
            .with_base_url(var("TRANSPORTAPI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
            .with_timeout(timeout_secs)
            .with_mock_fallback(mock_fallback);
        if let (Some(id), Some(key)) = (var("TRANSPORTAPI_APP_ID"), var("TRANSPORTAPI_APP_KEY")) {
            transport = transport.with_credentials(id, key);
        }
        if let Some(query) = var("TRANSPORTAPI_QUERY") {
            transport = transport.with_listing_query(query);
        }

        let auth = AuthClientConfig::new()
            .with_base_url(var("AUTH_BASE_URL").unwrap_or_else(|| DEFAULT_AUTH_BASE_URL.to_string()))
            .with_timeout(timeout_secs);

        let latency = match var("GOMATE_BOOKING_LATENCY_MS") {
            Some(value) => Duration::from_millis(parse("GOMATE_BOOKING_LATENCY_MS", value)?),
            None => DEFAULT_LATENCY,
        };

        Ok(Self {
            bind,
            data_dir,
            transport,
            auth,
            booking: BookingConfig::new(latency),
            cache: CacheConfig::default(),
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
