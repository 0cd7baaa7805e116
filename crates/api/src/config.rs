use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// Root of uploaded dataset images: `{upload_root}/{dataset_id}/{file}`.
    pub upload_root: PathBuf,
    /// Root of custom model weights: `{models_root}/{owner_id}/{file}`.
    pub models_root: PathBuf,
    /// Base URL of the inference sidecar.
    pub inference_url: String,
    /// Maximum number of custom models kept loaded.
    pub model_cache_capacity: usize,
    /// Number of annotation worker tasks.
    pub annotation_workers: usize,
    /// Capacity of the annotation job queue.
    pub annotation_queue_depth: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> T {
    parse_value(key, &env_or(key, default))
}

/// Worker, queue and cache sizes; zero is raised to one.
fn count_value(key: &str, raw: &str) -> usize {
    parse_value::<usize>(key, raw).max(1)
}

fn parse_count(key: &str, default: &str) -> usize {
    count_value(key, &env_or(key, default))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `3000`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                     |
    /// | `UPLOAD_ROOT`            | `uploads`                |
    /// | `MODELS_ROOT`            | `custom_models_user`     |
    /// | `INFERENCE_URL`          | `http://localhost:8500`  |
    /// | `MODEL_CACHE_CAPACITY`   | `8`                      |
    /// | `ANNOTATION_WORKERS`     | `2`                      |
    /// | `ANNOTATION_QUEUE_DEPTH` | `64`                     |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values and when `JWT_SECRET` is missing. The
    /// three sizing variables are raised to at least `1`.
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", "3000"),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30"),
            jwt: JwtConfig::from_env(),
            upload_root: PathBuf::from(env_or("UPLOAD_ROOT", "uploads")),
            models_root: PathBuf::from(env_or("MODELS_ROOT", "custom_models_user")),
            inference_url: env_or("INFERENCE_URL", "http://localhost:8500"),
            model_cache_capacity: parse_count("MODEL_CACHE_CAPACITY", "8"),
            annotation_workers: parse_count("ANNOTATION_WORKERS", "2"),
            annotation_queue_depth: parse_count("ANNOTATION_QUEUE_DEPTH", "64"),
        }
    }
}
