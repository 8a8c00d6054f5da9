//! Process settings from environment (optionally a `.env` file), and logging setup.

use crate::error::ConfigError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Validation(format!(
                "invalid DOCUMENT_STORE: {} (expected postgres or memory)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub resources_path: PathBuf,
    pub internal_call_token: Option<String>,
    pub store_backend: StoreBackend,
    pub docstore_schema: String,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match get("DOCUMENT_STORE") {
            Some(s) => s.parse()?,
            None => StoreBackend::Postgres,
        };
        let body_limit_bytes = match get("BODY_LIMIT_BYTES") {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid BODY_LIMIT_BYTES: {}", s)))?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };
        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/dancefloor".into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            resources_path: get("RESOURCES_PATH")
                .unwrap_or_else(|| "resources.json".into())
                .into(),
            internal_call_token: get("INTERNAL_CALL_TOKEN").filter(|s| !s.is_empty()),
            store_backend,
            docstore_schema: get("DOCSTORE_SCHEMA").unwrap_or_else(|| "docstore".into()),
            body_limit_bytes,
        })
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
