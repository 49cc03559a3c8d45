//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub use fueleu_observability::LogFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    /// SQLite URL; `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub seed_demo: bool,
    pub log_format: LogFormat,
}

impl EngineConfig {
    /// Load from `FUELEU_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source. Unset and blank values fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("FUELEU_BIND_ADDR") {
            Some(v) => parse("FUELEU_BIND_ADDR", &v, |s| {
                s.trim().parse::<SocketAddr>().map_err(|e| e.to_string())
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let seed_demo = match get("FUELEU_SEED_DEMO") {
            Some(v) => parse("FUELEU_SEED_DEMO", &v, parse_bool)?,
            None => true,
        };

        let log_format = match get("FUELEU_LOG_FORMAT") {
            Some(v) => parse("FUELEU_LOG_FORMAT", &v, LogFormat::from_str)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url: get("FUELEU_DATABASE_URL").map(|v| v.trim().to_string()),
            seed_demo,
            log_format,
        })
    }
}

fn parse<T>(
    var: &'static str,
    value: &str,
    f: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    f(value).map_err(|reason| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    })
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}
