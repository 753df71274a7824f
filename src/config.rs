//! Server configuration from environment variables.
//!
//! Every knob has a default so a bare `cargo run` serves an in-memory desk
//! on port 8081. A `.env` file is honoured when present.

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_PUBLIC_DIR: &str = "./public";
const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres URL. `None` selects in-memory storage.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Root directory for uploaded file bodies, one subdirectory per desk.
    pub upload_dir: PathBuf,
    /// Static assets served for every unrouted path.
    pub public_dir: PathBuf,
    /// Outbound envelopes buffered per session before deliveries are dropped.
    pub session_queue_capacity: usize,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            upload_dir: env_path("UPLOAD_DIR", DEFAULT_UPLOAD_DIR),
            public_dir: env_path("PUBLIC_DIR", DEFAULT_PUBLIC_DIR),
            session_queue_capacity: env_parse("SESSION_QUEUE_CAPACITY", DEFAULT_SESSION_QUEUE_CAPACITY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            session_queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}
