use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_ENDPOINT: &str = "https://fra.cloud.appwrite.io/v1";
const DEFAULT_PROJECT_ID: &str = "698ea85b0025d27750bf";
const DEFAULT_DATABASE_ID: &str = "orchestr8-db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Appwrite,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "appwrite" => Ok(Backend::Appwrite),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown backend '{other}', expected appwrite or memory")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub users: String,
    pub orders: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Option<String>,
    pub database_id: String,
    pub collections: Collections,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub request_timeout: Duration,
    pub backend: Backend,
    pub memory_seed_path: Option<PathBuf>,
    pub repository: RepositoryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_ms: u64 = parse_or_default(&lookup, "REQUEST_TIMEOUT_MS", 10_000)?;
        if timeout_ms == 0 {
            return Err(AppError::Internal(
                "invalid REQUEST_TIMEOUT_MS: must be > 0".to_string(),
            ));
        }

        let backend = parse_or_default(&lookup, "TRACKING_BACKEND", Backend::Appwrite)?;
        let project_id = text("APPWRITE_PROJECT_ID", DEFAULT_PROJECT_ID);
        if backend == Backend::Appwrite && project_id.trim().is_empty() {
            return Err(AppError::Internal(
                "APPWRITE_PROJECT_ID must not be blank for the appwrite backend".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default(&lookup, "HTTP_PORT", 3000)?,
            log_level: text("LOG_LEVEL", "info"),
            request_timeout: Duration::from_millis(timeout_ms),
            backend,
            memory_seed_path: optional("MEMORY_SEED_PATH").map(PathBuf::from),
            repository: RepositoryConfig {
                endpoint: text("APPWRITE_ENDPOINT", DEFAULT_ENDPOINT),
                project_id,
                api_key: optional("APPWRITE_API_KEY"),
                database_id: text("APPWRITE_DATABASE_ID", DEFAULT_DATABASE_ID),
                collections: Collections {
                    users: text("APPWRITE_USERS_COLLECTION", "users"),
                    orders: text("APPWRITE_ORDERS_COLLECTION", "orders"),
                },
            },
        })
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}
