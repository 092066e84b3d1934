use std::{env, fmt, net::SocketAddr, time::Duration};

use url::Url;

use super::{database_url, server_bind_address, DEFAULT_SERVER_URL};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Server configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = environment_from_env()?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        Ok(Self {
            bind_addr,
            environment,
            database_url: database_url(),
        })
    }
}

/// Configuration for the submitting side.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub timeout: Duration,
    pub environment: Environment,
}

impl ClientConfig {
    /// Reads `ONBOARD_SERVER_URL`, `ONBOARD_TIMEOUT_SECS` and `APP_ENV` (log format).
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = environment_from_env()?;
        let raw_url =
            env::var("ONBOARD_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let server_url = Url::parse(&raw_url).map_err(ConfigError::ServerUrl)?;

        let timeout_secs = match env::var("ONBOARD_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(value))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            server_url,
            timeout: Duration::from_secs(timeout_secs),
            environment,
        })
    }
}

fn environment_from_env() -> Result<Environment, ConfigError> {
    let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    Environment::from_str(&env_value)
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    ServerUrl(url::ParseError),
    InvalidTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::ServerUrl(err) => write!(f, "invalid ONBOARD_SERVER_URL value: {err}"),
            Self::InvalidTimeout(value) => write!(
                f,
                "ONBOARD_TIMEOUT_SECS must be a whole number of seconds (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::LazyLock<std::sync::Mutex<()>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(()));
