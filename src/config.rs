//! Server settings, read from flags with environment fallbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Args;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
    #[error("--max-iterations must be > 0")]
    ZeroMaxIterations,
    #[error("--default-iterations must be between 1 and --max-iterations ({max})")]
    DefaultIterationsOutOfRange { max: u32 },
    #[error("--simulation-timeout-secs must be > 0")]
    ZeroTimeout,
    #[error("--max-compare-scenarios must be > 0")]
    ZeroCompareScenarios,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    #[arg(long, env = "NESTEGG_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[arg(long, env = "NESTEGG_PORT", default_value_t = 8000)]
    pub port: u16,
    #[arg(
        long = "allowed-origin",
        env = "NESTEGG_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000",
        help = "Origins allowed by CORS; '*' allows any origin without credentials"
    )]
    pub allowed_origins: Vec<String>,
    #[arg(
        long,
        env = "NESTEGG_DEFAULT_ITERATIONS",
        default_value_t = 500,
        help = "Monte Carlo trials when a request does not name a count"
    )]
    pub default_iterations: u32,
    #[arg(long, env = "NESTEGG_MAX_ITERATIONS", default_value_t = 10_000)]
    pub max_iterations: u32,
    #[arg(
        long,
        env = "NESTEGG_SIMULATION_TIMEOUT_SECS",
        default_value_t = 30,
        help = "Monte Carlo requests running longer than this are cancelled"
    )]
    pub simulation_timeout_secs: u64,
    #[arg(long, env = "NESTEGG_MAX_COMPARE_SCENARIOS", default_value_t = 10)]
    pub max_compare_scenarios: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            default_iterations: 500,
            max_iterations: 10_000,
            simulation_timeout_secs: 30,
            max_compare_scenarios: 10,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations);
        }
        if self.default_iterations == 0 || self.default_iterations > self.max_iterations {
            return Err(ConfigError::DefaultIterationsOutOfRange {
                max: self.max_iterations,
            });
        }
        if self.simulation_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_compare_scenarios == 0 {
            return Err(ConfigError::ZeroCompareScenarios);
        }
        self.cors_origins().map(|_| ())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn simulation_timeout(&self) -> Duration {
        Duration::from_secs(self.simulation_timeout_secs)
    }

    pub fn cors_origins(&self) -> Result<CorsOrigins, ConfigError> {
        if self.allowed_origins.iter().any(|o| o.trim() == "*") {
            return Ok(CorsOrigins::Any);
        }
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim())
                    .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(CorsOrigins::List)
    }
}
