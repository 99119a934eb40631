use serde::{Deserialize, Serialize};
use std::{
    net::{AddrParseError, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::Level;

/// Configuration for the riddle-hunt server, usually read from YAML.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    /// Per-IP request quota. Unlimited when absent.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// Token bucket applied per client IP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimit {
    /// Milliseconds needed to regain one request of quota.
    pub replenish_interval_ms: u64,
    /// Requests that may be made back to back.
    pub burst_size: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("invalid listen address: {value}")]
    InvalidAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
}

pub struct ValidatedConfig {
    pub addr: SocketAddr,
    pub log_level: Level,
    pub json_logs: bool,
    pub rate_limit: Option<RateLimit>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            rate_limit: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let listen = format!("{}:{}", self.host, self.port);
        let addr = SocketAddr::from_str(&listen)
            .map_err(|source| ConfigError::InvalidAddress { value: listen, source })?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        if let Some(limit) = &self.rate_limit {
            if limit.replenish_interval_ms == 0 {
                return Err(ConfigError::InvalidNonZero {
                    field: "rate_limit.replenish_interval_ms",
                    value: limit.replenish_interval_ms,
                });
            }
            if limit.burst_size == 0 {
                return Err(ConfigError::InvalidNonZero {
                    field: "rate_limit.burst_size",
                    value: limit.burst_size as u64,
                });
            }
        }

        Ok(ValidatedConfig {
            addr,
            log_level,
            json_logs: self.json_logs,
            rate_limit: self.rate_limit,
        })
    }
}
