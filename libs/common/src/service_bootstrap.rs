//! Unified service bootstrap utilities
//!
//! Provides common initialization functionality for the adaptor services,
//! including startup banners, logging initialization, and environment setup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::logging::{self, LogConfig};

/// Service metadata for startup
pub struct ServiceInfo {
    /// Service name (e.g., "adaptorsrv")
    pub name: String,
    /// Service version from Cargo.toml
    pub version: String,
    /// Service description
    pub description: String,
    /// Default port
    pub default_port: u16,
}

impl ServiceInfo {
    /// Create new service info
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_port: u16) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: description.into(),
            default_port,
        }
    }

    /// Override the version (services pass their own `CARGO_PKG_VERSION`)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Logging section shared by every service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log directory (overridden by `ADAPTOR_LOG_DIR`)
    #[serde(default)]
    pub dir: Option<String>,
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON lines in the log file
    #[serde(default = "default_true")]
    pub json: bool,
    /// Roll the file over after this many bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_log_level(),
            json: true,
            max_file_size: default_max_file_size(),
        }
    }
}

/// Print startup banner for a service
pub fn print_startup_banner(service: &ServiceInfo) {
    let rule = "=".repeat(56);
    info!("{}", rule);
    info!(" {} v{}", service.name.to_uppercase(), service.version);
    info!(" {}", service.description);
    info!(" Default Port: {}", service.default_port);
    info!("{}", rule);
}

/// Initialize logging for a service
///
/// Log root directory priority:
/// 1. ADAPTOR_LOG_DIR environment variable
/// 2. settings.dir from the service configuration
/// 3. Default "logs"
pub fn init_logging(
    service: &ServiceInfo,
    settings: &LoggingSettings,
    ansi: bool,
) -> anyhow::Result<()> {
    logging::init_log_root(settings.dir.as_deref());

    let log_config = LogConfig {
        service_name: service.name.clone(),
        log_dir: logging::get_log_root(),
        level: settings.level.clone(),
        enable_json: settings.json,
        ansi,
        max_file_size: settings.max_file_size,
    };

    logging::init_with_config(log_config).map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// Load an env file into the process environment
///
/// Variables that are already set are left untouched. Returns `false` when
/// the file is missing or unreadable. Call this before any threads start.
pub fn load_env_file(path: impl AsRef<Path>) -> bool {
    dotenv::from_path(path.as_ref()).is_ok()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_service_info_creation() {
        let service = ServiceInfo::new("test_service", "Test Service", 8080);
        assert_eq!(service.name, "test_service");
        assert_eq!(service.description, "Test Service");
        assert_eq!(service.default_port, 8080);
    }

    #[test]
    fn test_load_env_file_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# comment\nADAPTOR_TEST_ENV_NEW=fresh\nADAPTOR_TEST_ENV_SET=from_file\nADAPTOR_TEST_ENV_QUOTED='sqlite:data/info.db'\n",
        )
        .unwrap();
        std::env::set_var("ADAPTOR_TEST_ENV_SET", "from_process");

        assert!(load_env_file(&path));

        assert_eq!(std::env::var("ADAPTOR_TEST_ENV_NEW").unwrap(), "fresh");
        assert_eq!(
            std::env::var("ADAPTOR_TEST_ENV_QUOTED").unwrap(),
            "sqlite:data/info.db"
        );
        assert_eq!(
            std::env::var("ADAPTOR_TEST_ENV_SET").unwrap(),
            "from_process"
        );
    }

    #[test]
    fn test_load_env_file_missing() {
        assert!(!load_env_file("/nonexistent/path/.env"));
    }
}
