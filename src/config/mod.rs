use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Skip-trace provider settings
    pub trace_api: TraceApiConfig,
    /// SQLite settings
    pub database: DatabaseConfig,
    /// Session store settings
    pub session: SessionConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// HTTP request settings
    pub request: RequestConfig,
}

/// Skip-trace provider configuration
#[derive(Debug, Clone)]
pub struct TraceApiConfig {
    /// Empty when not configured; only lookups need it.
    pub api_key: String,
    /// Provider base URL
    pub base_url: String,
    /// Value of the `x-rapidapi-host` header
    pub host: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: PathBuf,
    /// Connection pool size
    pub max_connections: u32,
}

/// Session store configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prefix for the two persisted keys.
    pub namespace: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human readable
    Pretty,
    /// One JSON object per line
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay, doubled on each retry
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let trace_api = TraceApiConfig {
            api_key: env::var("TRACE_API_KEY").unwrap_or_default(),
            base_url: env::var("TRACE_API_BASE_URL")
                .unwrap_or_else(|_| "https://skip-tracing-working-api.p.rapidapi.com".to_string()),
            host: env::var("TRACE_API_HOST")
                .unwrap_or_else(|_| "skip-tracing-working-api.p.rapidapi.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/trace.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let namespace = env::var("SESSION_NAMESPACE").unwrap_or_else(|_| "mnuda".to_string());
        if namespace.trim().is_empty() {
            return Err(AppError::Config {
                message: "SESSION_NAMESPACE cannot be empty".to_string(),
            });
        }
        let session = SessionConfig { namespace };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        Ok(Config {
            trace_api,
            database,
            session,
            logging,
            request,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: "mnuda".to_string(),
        }
    }
}
