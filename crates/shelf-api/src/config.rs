//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use shelf_core::{Error, Result};
use shelf_store::StoreOptions;

/// Default HTTP port (matches the original deployment's convention).
pub const DEFAULT_HTTP_PORT: u16 = 7861;

/// Default per-collection lock wait budget in milliseconds.
pub const DEFAULT_LOCK_WAIT_MS: u64 = 5_000;

/// Default maximum attempts per blob operation.
pub const DEFAULT_STORAGE_ATTEMPTS: u32 = 3;

/// Default request body limit for uploads (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsConfig {
    /// Allowed origins. `["*"]` allows any origin; empty disables CORS
    /// origin handling entirely.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Preflight cache max age in seconds.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3_600,
        }
    }
}

/// Configuration for the shelf API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode (pretty logs, in-memory storage fallback).
    pub debug: bool,

    /// Root directory for the filesystem blob repository.
    ///
    /// When unset, the server falls back to in-memory storage — allowed only
    /// in debug mode.
    pub storage_root: Option<PathBuf>,

    /// Per-collection lock wait budget in milliseconds.
    pub lock_wait_ms: u64,

    /// Maximum attempts per blob operation (1 = no retries).
    pub storage_attempts: u32,

    /// Maximum accepted upload body size in bytes.
    pub max_upload_bytes: usize,

    /// CORS settings.
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            debug: false,
            storage_root: None,
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
            storage_attempts: DEFAULT_STORAGE_ATTEMPTS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SHELF_HTTP_PORT`: HTTP port (default 7861)
    /// - `SHELF_DEBUG`: debug mode (default false)
    /// - `SHELF_STORAGE_ROOT`: filesystem blob root (required unless debug)
    /// - `SHELF_LOCK_WAIT_MS`: lock wait budget (default 5000)
    /// - `SHELF_STORAGE_RETRIES`: max attempts per blob op (default 3)
    /// - `SHELF_MAX_UPLOAD_BYTES`: upload body limit (default 64 MiB)
    /// - `SHELF_CORS_ALLOWED_ORIGINS`: comma-separated origin list
    /// - `SHELF_CORS_MAX_AGE_SECONDS`: preflight cache max age
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("SHELF_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool("SHELF_DEBUG")? {
            config.debug = debug;
        }
        if let Some(root) = env_string("SHELF_STORAGE_ROOT") {
            config.storage_root = Some(PathBuf::from(root));
        }
        if let Some(wait) = env_u64("SHELF_LOCK_WAIT_MS")? {
            if wait == 0 {
                return Err(Error::InvalidInput(
                    "SHELF_LOCK_WAIT_MS must be greater than 0".to_string(),
                ));
            }
            config.lock_wait_ms = wait;
        }
        if let Some(attempts) = env_u32("SHELF_STORAGE_RETRIES")? {
            if attempts == 0 {
                return Err(Error::InvalidInput(
                    "SHELF_STORAGE_RETRIES must be greater than 0".to_string(),
                ));
            }
            config.storage_attempts = attempts;
        }
        if let Some(max) = env_usize("SHELF_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = max;
        }
        if let Some(origins) = env_string("SHELF_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_cors_allowed_origins(&origins);
        }
        if let Some(max_age) = env_u64("SHELF_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }

        Ok(config)
    }

    /// Returns the store tuning derived from this configuration.
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            lock_wait: Duration::from_millis(self.lock_wait_ms),
            storage_attempts: self.storage_attempts,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u32>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u32: {e}")))
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<usize>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a usize: {e}")))
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    parse_bool(name, &v).map(Some)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_cors_allowed_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
