use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "info,task_tracker=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TASKS_BIND_ADDR {value:?} is not a socket address: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("TASKS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::BindAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let log_filter = lookup("TASKS_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        if log_filter.trim().is_empty() {
            return Err(ConfigError::Empty("TASKS_LOG"));
        }

        let cors_origin = match lookup("TASKS_CORS_ORIGIN") {
            Some(origin) if origin.trim().is_empty() => {
                return Err(ConfigError::Empty("TASKS_CORS_ORIGIN"))
            }
            other => other,
        };

        Ok(Config {
            bind_addr,
            log_filter,
            cors_origin,
        })
    }
}
