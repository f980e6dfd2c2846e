//! Environment-driven configuration.

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub metabase_url: String,
    pub metabase_api_key: String,
    pub metabase_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8080),
            metabase_url: env::var("METABASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            metabase_api_key: env::var("METABASE_API_KEY").unwrap_or_default(),
            metabase_timeout_secs: env::var("METABASE_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// SQLite database location; services open a connection per operation.
pub fn database_path() -> String {
    env::var("DATABASE_PATH").unwrap_or_else(|_| "analytics_metadata.sqlite".to_string())
}

/// Directory where uploaded template files are kept.
pub fn upload_dir() -> PathBuf {
    PathBuf::from(
        env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads/excel_templates".to_string()),
    )
}
