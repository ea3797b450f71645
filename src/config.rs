use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::bench::DEFAULT_QUERIES;
use crate::directory::EmployeeQuery;

/// Upper bound on `queries` per run accepted from clients.
pub const MAX_QUERIES: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Redis,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::Invalid {
                key: "BENCH_BACKEND",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("BENCH_DEFAULT_QUERIES must be between 1 and 10000, got {0}")]
    QueriesOutOfRange(u32),
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub backend: Backend,
    pub redis_url: String,
    pub default_queries: u32,
    /// Roster size before the guaranteed matches are appended.
    pub employees: usize,
    pub query: EmployeeQuery,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            backend: Backend::Memory,
            redis_url: "redis://127.0.0.1:6379/".into(),
            default_queries: DEFAULT_QUERIES,
            employees: 10_000,
            query: EmployeeQuery::default(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then overlay `BENCH_*` / `REDIS_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = var("BENCH_BIND_ADDR") {
            cfg.bind_addr = parse("BENCH_BIND_ADDR", v)?;
        }
        if let Some(v) = var("BENCH_BACKEND") {
            cfg.backend = v.parse()?;
        }
        if let Some(v) = var("REDIS_URL") {
            cfg.redis_url = v;
        }
        if let Some(v) = var("BENCH_DEFAULT_QUERIES") {
            cfg.default_queries = parse("BENCH_DEFAULT_QUERIES", v)?;
        }
        if let Some(v) = var("BENCH_EMPLOYEES") {
            cfg.employees = parse("BENCH_EMPLOYEES", v)?;
        }
        if let Some(v) = var("BENCH_FIRST_NAME") {
            cfg.query.first_name = v;
        }
        if let Some(v) = var("BENCH_LAST_NAME") {
            cfg.query.last_name = v;
        }

        if cfg.default_queries == 0 || cfg.default_queries > MAX_QUERIES {
            return Err(ConfigError::QueriesOutOfRange(cfg.default_queries));
        }

        Ok(cfg)
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
