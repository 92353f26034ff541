//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

const MIN_SESSION_SECRET_BYTES: usize = 32;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
    /// Public domain (e.g., "rookery.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Maximum accepted request body; image data URIs travel inline
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://rookery.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub media: MediaStorageConfig,
}

/// Which media host implementation to use
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    /// Cloudflare R2 through the S3 API
    #[default]
    R2,
    /// Process-local map, for development and tests
    Memory,
}

/// Media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaStorageConfig {
    #[serde(default)]
    pub backend: MediaBackend,
    /// R2 bucket name for media
    pub bucket: String,
    /// Public URL for media (Custom Domain)
    /// e.g., "https://media.example.com"
    pub public_url: String,
}

/// Cloudflare credentials
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloudflareConfig {
    /// Cloudflare account ID
    pub account_id: String,
    /// R2 access key ID
    pub r2_access_key_id: String,
    /// R2 secret access key
    pub r2_secret_access_key: String,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
}

/// Logging configuration
///
/// `RUST_LOG`, when set, still wins over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// `EnvFilter` directive applying `level` to this crate and the HTTP trace layer
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        format!("rookery={level},tower_http={level}")
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (ROOKERY__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/rookery.db")?
            .set_default("storage.media.backend", "r2")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("ROOKERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Local-only configuration: loopback bind, in-memory media host
    ///
    /// Used by integration tests and for quick experiments; never
    /// suitable for a public deployment.
    pub fn local(database_path: PathBuf) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
                body_limit_bytes: default_body_limit_bytes(),
            },
            database: DatabaseConfig {
                path: database_path,
            },
            storage: StorageConfig {
                media: MediaStorageConfig {
                    backend: MediaBackend::Memory,
                    bucket: "media".to_string(),
                    public_url: "http://localhost/media".to_string(),
                },
            },
            cloudflare: CloudflareConfig::default(),
            auth: AuthConfig {
                session_secret: "local-session-secret-at-least-32-bytes".to_string(),
                session_max_age: 604_800,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    /// Cookies are marked `Secure` unless serving plain http on a loopback host
    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https") || !is_local_domain(&self.server.domain)
    }

    fn validate(&self) -> Result<(), AppError> {
        let problem = if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            Some(format!(
                "auth.session_secret must be at least {MIN_SESSION_SECRET_BYTES} bytes"
            ))
        } else if self.auth.session_max_age <= 0 {
            Some("auth.session_max_age must be greater than 0".to_string())
        } else if self.storage.media.backend == MediaBackend::R2
            && self.cloudflare.account_id.trim().is_empty()
        {
            Some("cloudflare.account_id is required when storage.media.backend=r2".to_string())
        } else if self.should_use_secure_cookies()
            && !self.server.protocol.eq_ignore_ascii_case("https")
        {
            Some("server.protocol must be https for non-local server domains".to_string())
        } else if !LOG_LEVELS.contains(&self.logging.level.trim().to_ascii_lowercase().as_str()) {
            Some(format!("logging.level must be one of {}", LOG_LEVELS.join(", ")))
        } else if !matches!(
            self.logging.format.trim().to_ascii_lowercase().as_str(),
            "pretty" | "json"
        ) {
            Some("logging.format must be \"pretty\" or \"json\"".to_string())
        } else {
            None
        };

        match problem {
            Some(problem) => Err(AppError::Config(problem)),
            None => Ok(()),
        }
    }
}

/// Whether `domain` (optionally with a port) names this machine
fn is_local_domain(domain: &str) -> bool {
    let Ok(parsed) = url::Url::parse(&format!("http://{}", domain.trim())) else {
        return false;
    };

    match parsed.host() {
        Some(url::Host::Domain(name)) => {
            let name = name.trim_end_matches('.');
            name == "localhost" || name.ends_with(".localhost")
        }
        Some(url::Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
        None => false,
    }
}
