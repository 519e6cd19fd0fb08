//! Process configuration read from the environment.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

use crate::db;
use crate::db::pool::DEFAULT_MAX_CONNECTIONS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Explicit `DATABASE_PATH`, or the default file under `STATE_DIR`
    /// (current working directory when unset).
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let state_dir = env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let database_path = resolve_database_path(env::var("DATABASE_PATH").ok(), &state_dir);

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;
        if max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let log_level = parse_log_level(env::var("LOG_LEVEL").ok())
            .context("LOG_LEVEL must be one of off, error, warn, info, debug, trace")?;

        Ok(Config {
            host,
            port,
            database_path,
            max_connections,
            log_level,
        })
    }

    /// `host:port` string for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Use an explicit database path if given, otherwise the default file in `state_dir`.
///
/// Blank values count as unset.
pub fn resolve_database_path(value: Option<String>, state_dir: &std::path::Path) -> PathBuf {
    value
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| db::get_db_path(state_dir))
}

/// Parse a log level name, defaulting to `info` when unset.
pub fn parse_log_level(value: Option<String>) -> Result<LevelFilter> {
    match value.filter(|s| !s.trim().is_empty()) {
        None => Ok(LevelFilter::INFO),
        Some(raw) => raw
            .trim()
            .parse::<LevelFilter>()
            .with_context(|| format!("unknown log level {:?}", raw)),
    }
}
