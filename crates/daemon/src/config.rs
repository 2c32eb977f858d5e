//! Daemon configuration from environment variables
//!
//! | variable                   | default          |
//! |----------------------------|------------------|
//! | `LSA_DB_PATH`              | `~/.lsa/spa.db`  |
//! | `LSA_DB_MAX_CONNECTIONS`   | `5`              |
//! | `LSA_RPC_PORT`             | `9630`           |
//! | `LSA_SWEEP_INTERVAL_HOURS` | `24`             |
//! | `LSA_LOG_FORMAT`           | `pretty`         |

use lsa_api_rpc::server::DEFAULT_RPC_PORT;
use lsa_core::application::constants::DEFAULT_SWEEP_INTERVAL;
use lsa_core::error::{AppError, Result};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const DEFAULT_DB_PATH: &str = "~/.lsa/spa.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` falls back to pretty output
    pub fn from_env() -> Self {
        match std::env::var("LSA_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub db_path: String,
    pub db_max_connections: u32,
    pub rpc_port: u16,
    pub sweep_interval: Duration,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment in production, maps in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("LSA_DB_PATH") {
            Some(path) if !path.trim().is_empty() => path,
            _ => {
                info!("LSA_DB_PATH not set, using default: {DEFAULT_DB_PATH}");
                DEFAULT_DB_PATH.to_string()
            }
        };

        let sweep_interval_hours: u64 = parse_or(
            &lookup,
            "LSA_SWEEP_INTERVAL_HOURS",
            DEFAULT_SWEEP_INTERVAL.as_secs() / 3600,
        )?;
        if sweep_interval_hours == 0 {
            return Err(AppError::Config(
                "LSA_SWEEP_INTERVAL_HOURS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            db_path: shellexpand::tilde(&db_path).into_owned(),
            db_max_connections: parse_or(
                &lookup,
                "LSA_DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            rpc_port: parse_or(&lookup, "LSA_RPC_PORT", DEFAULT_RPC_PORT)?,
            sweep_interval: Duration::from_secs(sweep_interval_hours * 3600),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {key} value {raw:?}: {e}"))),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
