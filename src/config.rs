/// Configuration management for the Trustimonials service
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable base URL, used in embed snippets and share links
    pub public_url: String,
    /// Base URL of the dashboard frontend, used when composing share links
    pub frontend_url: String,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Public submissions allowed per (IP, space) window
    pub submission_burst: u32,
    /// Window length, in seconds, over which the submission burst refills
    pub submission_window_secs: u64,
    pub authenticated_rps: u32,
    pub unauthenticated_rps: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("TRST_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("TRST_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;

        let public_url = env::var("TRST_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));
        let frontend_url =
            env::var("TRST_FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let version = env::var("TRST_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("TRST_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("TRST_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("trustimonials.sqlite"));

        let rate_limit = RateLimitSettings {
            enabled: env_parse("TRST_RATE_LIMITS_ENABLED", true),
            submission_burst: env_parse("TRST_SUBMISSION_BURST", 10),
            submission_window_secs: env_parse("TRST_SUBMISSION_WINDOW_SECS", 900),
            authenticated_rps: env_parse("TRST_AUTHENTICATED_RPS", 100),
            unauthenticated_rps: env_parse("TRST_UNAUTHENTICATED_RPS", 10),
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                frontend_url,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            rate_limit,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.rate_limit.submission_burst == 0 {
            return Err(ApiError::Validation(
                "Submission burst must be at least 1".to_string(),
            ));
        }

        if self.rate_limit.submission_window_secs == 0 {
            return Err(ApiError::Validation(
                "Submission window must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}
