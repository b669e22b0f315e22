use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::analytics::scoring::Precision;

/// Minimum calls an agent needs before entering correlation statistics.
pub const DEFAULT_MIN_AGENT_CALLS: usize = 5;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub analysis: AnalysisConfig,
    /// JSON snapshot loaded into the in-memory store at startup.
    pub dataset: Option<PathBuf>,
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

        let min_agent_calls = match env::var("CALLQA_MIN_AGENT_CALLS") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidMinAgentCalls { value })?,
            Err(_) => DEFAULT_MIN_AGENT_CALLS,
        };

        let precision = match env::var("CALLQA_PRECISION") {
            Ok(value) => value
                .parse::<Precision>()
                .map_err(|_| ConfigError::InvalidPrecision { value })?,
            Err(_) => Precision::Exact,
        };

        let dataset = env::var("CALLQA_DATASET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis: AnalysisConfig {
                min_agent_calls,
                precision,
            },
            dataset,
        })
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

/// Knobs for the aggregate reporting paths.
///
/// `min_agent_calls` only filters analysis-mode agent populations; per-call
/// scoring and the display scorecard ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub min_agent_calls: usize,
    pub precision: Precision,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_agent_calls: DEFAULT_MIN_AGENT_CALLS,
            precision: Precision::Exact,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMinAgentCalls { value: String },
    InvalidPrecision { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMinAgentCalls { value } => write!(
                f,
                "CALLQA_MIN_AGENT_CALLS must be a non-negative integer, got '{}'",
                value
            ),
            ConfigError::InvalidPrecision { value } => write!(
                f,
                "CALLQA_PRECISION must be 'rounded' or 'exact', got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMinAgentCalls { .. }
            | ConfigError::InvalidPrecision { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CALLQA_DATASET",
            "CALLQA_MIN_AGENT_CALLS",
            "CALLQA_PRECISION",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(config.dataset.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_analysis_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CALLQA_MIN_AGENT_CALLS", "3");
        env::set_var("CALLQA_PRECISION", "rounded");
        env::set_var("CALLQA_DATASET", "/tmp/calls.json");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.analysis.min_agent_calls, 3);
        assert_eq!(config.analysis.precision, Precision::Rounded);
        assert_eq!(config.dataset, Some(PathBuf::from("/tmp/calls.json")));
        reset_env();
    }

    #[test]
    fn rejects_invalid_analysis_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CALLQA_MIN_AGENT_CALLS", "five");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidMinAgentCalls { .. })
        ));

        reset_env();
        env::set_var("CALLQA_PRECISION", "fuzzy");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPrecision { .. })
        ));
        reset_env();
    }
}
