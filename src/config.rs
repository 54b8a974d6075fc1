//! Configuration module for docdesk.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use axum::http::HeaderName;
use jsonwebtoken::Algorithm;

use crate::{DocError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the storage directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "storage".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Externally reachable addresses of this service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Base URL browsers use to reach this service.
    ///
    /// Defaults to `http://localhost:{port}`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Base URL the external editor uses to reach this service.
    ///
    /// Defaults to `base_url`.
    #[serde(default)]
    pub editor_base_url: Option<String>,
}

/// External editor integration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// Base address of the external editor service.
    #[serde(default = "default_editor_base_url")]
    pub base_url: String,
    /// Editor UI language.
    #[serde(default = "default_editor_lang")]
    pub lang: String,
    /// Shared signing secret. Empty disables signing and verification.
    #[serde(default)]
    pub jwt_secret: String,
    /// Signing algorithm name (HS256, HS384, HS512).
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    /// Request header carrying the callback token.
    #[serde(default = "default_jwt_header")]
    pub jwt_header: String,
    /// Total timeout for downloading saved documents, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    /// Maximum size of a downloaded document in megabytes.
    #[serde(default = "default_max_download_size")]
    pub max_download_size_mb: u64,
}

fn default_editor_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_editor_lang() -> String {
    "zh-CN".to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_jwt_header() -> String {
    "Authorization".to_string()
}

fn default_download_timeout() -> u64 {
    30
}

fn default_max_download_size() -> u64 {
    100
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: default_editor_base_url(),
            lang: default_editor_lang(),
            jwt_secret: String::new(),
            jwt_algorithm: default_jwt_algorithm(),
            jwt_header: default_jwt_header(),
            download_timeout_secs: default_download_timeout(),
            max_download_size_mb: default_max_download_size(),
        }
    }
}

impl EditorConfig {
    /// Maximum size of a downloaded document in bytes.
    pub fn max_download_bytes(&self) -> u64 {
        mib_to_bytes(self.max_download_size_mb)
    }

    /// Whether callbacks and session configs are signed.
    pub fn signing_enabled(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    /// Parse the configured algorithm, accepting only HMAC variants.
    pub fn algorithm(&self) -> Result<Algorithm> {
        let algorithm = Algorithm::from_str(self.jwt_algorithm.trim()).map_err(|_| {
            DocError::Config(format!("unknown jwt_algorithm: {}", self.jwt_algorithm))
        })?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(DocError::Config(format!(
                "jwt_algorithm {other:?} is not an HMAC algorithm"
            ))),
        }
    }

    /// Parse the configured token header name.
    pub fn header_name(&self) -> Result<HeaderName> {
        HeaderName::from_str(&self.jwt_header.to_ascii_lowercase())
            .map_err(|_| DocError::Config(format!("invalid jwt_header: {}", self.jwt_header)))
    }
}

/// Web layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins. Empty allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/docdesk.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Public addresses of this service.
    #[serde(default)]
    pub app: AppConfig,
    /// External editor configuration.
    #[serde(default)]
    pub editor: EditorConfig,
    /// Web layer configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Megabytes to bytes, clamped instead of overflowing.
pub fn mib_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

/// Strip trailing slashes from a base URL.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DocError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DocError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORT`, `STORAGE_DIR`
    /// - `APP_BASE_URL`, `EDITOR_APP_BASE_URL`, `EDITOR_BASE_URL`
    /// - `CORS_ORIGINS` (comma-separated)
    /// - `EDITOR_JWT_SECRET`, `EDITOR_JWT_ALG`, `EDITOR_JWT_HEADER`
    /// - `LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(dir) = get("STORAGE_DIR") {
            self.storage.path = dir;
        }
        if let Some(url) = get("APP_BASE_URL") {
            self.app.base_url = Some(url);
        }
        if let Some(url) = get("EDITOR_APP_BASE_URL") {
            self.app.editor_base_url = Some(url);
        }
        if let Some(url) = get("EDITOR_BASE_URL") {
            self.editor.base_url = url;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            self.web.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(secret) = get("EDITOR_JWT_SECRET") {
            self.editor.jwt_secret = secret;
        }
        if let Some(alg) = get("EDITOR_JWT_ALG") {
            self.editor.jwt_algorithm = alg;
        }
        if let Some(header) = get("EDITOR_JWT_HEADER") {
            self.editor.jwt_header = header;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Base URL browsers use to reach this service, without trailing slash.
    pub fn app_base_url(&self) -> String {
        match &self.app.base_url {
            Some(url) => normalize_base_url(url),
            None => format!("http://localhost:{}", self.server.port),
        }
    }

    /// Base URL the external editor uses to reach this service.
    pub fn editor_app_base_url(&self) -> String {
        match &self.app.editor_base_url {
            Some(url) => normalize_base_url(url),
            None => self.app_base_url(),
        }
    }

    /// Base address of the external editor, without trailing slash.
    pub fn editor_base_url(&self) -> String {
        normalize_base_url(&self.editor.base_url)
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(mib_to_bytes(self.storage.max_upload_size_mb)).unwrap_or(usize::MAX)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(DocError::Config("server.port must not be 0".to_string()));
        }
        self.editor.algorithm()?;
        self.editor.header_name()?;
        Ok(())
    }
}
