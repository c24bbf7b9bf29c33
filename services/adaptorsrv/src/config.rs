//! Service configuration
//!
//! Layered with figment, lowest priority first:
//! 1. built-in defaults
//! 2. optional YAML file
//! 3. flat deployment variables (`ENDPOINT_URL`, `DATABASE_URL`, ...)
//! 4. structured variables `ADAPTOR_<SECTION>__<KEY>`

use std::net::SocketAddr;
use std::path::Path;

use common::service_bootstrap::LoggingSettings;
use errors::{AdaptorError, AdaptorResult};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    value::{Uncased, UncasedStr},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Default lookup collection (table) name
pub const DEFAULT_COLLECTION: &str = "info";

/// Prefix for structured environment overrides
pub const ENV_PREFIX: &str = "ADAPTOR_";

/// Flat variables understood for compatibility with existing deployments
const FLAT_ENV_KEYS: &[&str] = &[
    "ENDPOINT_URL",
    "DATABASE_URL",
    "CLASSIFICATION_COLLECTION",
    "APP_MODE",
    "BIND_ADDRESS",
];

/// Complete adaptor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdaptorConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_service_name")]
    pub name: String,
    pub description: Option<String>,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            description: None,
        }
    }
}

fn default_service_name() -> String {
    "adaptorsrv".to_string()
}

/// Run mode; decides the default bind interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Loopback only
    Debug,
    /// All interfaces
    #[default]
    Release,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub mode: RunMode,
    /// Explicit bind address; overrides the mode default
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            bind_address: None,
            port: DEFAULT_PORT,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ApiConfig {
    /// Resolve the listen address
    ///
    /// `bind_address` wins when set; otherwise `release` binds
    /// `0.0.0.0:<port>` and `debug` binds `127.0.0.1:<port>`.
    pub fn socket_addr(&self) -> AdaptorResult<SocketAddr> {
        let raw = match &self.bind_address {
            Some(addr) if !addr.trim().is_empty() => normalize_bind(addr.trim()),
            _ => match self.mode {
                RunMode::Release => format!("0.0.0.0:{}", self.port),
                RunMode::Debug => format!("127.0.0.1:{}", self.port),
            },
        };
        raw.parse().map_err(|e| AdaptorError::InvalidConfig {
            field: "api.bind_address".to_string(),
            reason: format!("{}: {}", raw, e),
        })
    }
}

/// Accept the `:8000` shorthand for "all interfaces"
fn normalize_bind(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Where the part code → part type table comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// SQLite collection of documents
    #[default]
    Database,
    /// CSV file on disk
    Csv,
    /// Table compiled into the binary
    Builtin,
    /// Empty table, everything classifies to the default
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default)]
    pub source: SourceKind,
    /// sqlx SQLite URL, e.g. `sqlite:data/adaptor.db`
    #[serde(default)]
    pub database_url: Option<String>,
    /// Table holding one document per row
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub csv_path: Option<String>,
    /// Classification returned for unknown part codes
    #[serde(default)]
    pub default_part_type: i32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            database_url: None,
            collection: default_collection(),
            csv_path: None,
            default_part_type: 0,
        }
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

/// What the handler does when the downstream cannot be reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardFailurePolicy {
    /// Answer 502 Bad Gateway
    #[default]
    Reject,
    /// Log and still answer 204
    Accept,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownstreamConfig {
    #[serde(default)]
    pub endpoint_url: String,
    /// Request timeout; unset keeps the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub on_error: ForwardFailurePolicy,
}

/// Map flat deployment variables onto their nested keys
fn flat_env_key(key: &UncasedStr) -> Uncased<'_> {
    let nested = match key.as_str().to_ascii_uppercase().as_str() {
        "ENDPOINT_URL" => "downstream.endpoint_url",
        "DATABASE_URL" => "classification.database_url",
        "CLASSIFICATION_COLLECTION" => "classification.collection",
        "APP_MODE" => "api.mode",
        "BIND_ADDRESS" => "api.bind_address",
        _ => return Uncased::from(key.as_str().to_ascii_lowercase()),
    };
    Uncased::from(nested)
}

impl AdaptorConfig {
    /// Build the provider stack
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AdaptorConfig::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::raw().only(FLAT_ENV_KEYS).map(flat_env_key))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration
    pub fn load(config_file: Option<&Path>) -> AdaptorResult<Self> {
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(AdaptorError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let config: AdaptorConfig = Self::figment(config_file).extract()?;
        debug!("Config loaded");

        config.validate()?;
        Ok(config)
    }

    /// Check the values the service cannot run without
    pub fn validate(&self) -> AdaptorResult<()> {
        let endpoint = self.downstream.endpoint_url.trim();
        if endpoint.is_empty() {
            return Err(AdaptorError::MissingConfig(
                "downstream.endpoint_url (ENDPOINT_URL)".to_string(),
            ));
        }
        let url = reqwest::Url::parse(endpoint).map_err(|e| AdaptorError::InvalidConfig {
            field: "downstream.endpoint_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AdaptorError::InvalidConfig {
                field: "downstream.endpoint_url".to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.downstream.timeout_secs == Some(0) {
            return Err(AdaptorError::InvalidConfig {
                field: "downstream.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        match self.classification.source {
            SourceKind::Database => {
                let has_url = self
                    .classification
                    .database_url
                    .as_deref()
                    .is_some_and(|u| !u.trim().is_empty());
                if !has_url {
                    return Err(AdaptorError::MissingConfig(
                        "classification.database_url (DATABASE_URL)".to_string(),
                    ));
                }
                if !is_valid_identifier(&self.classification.collection) {
                    return Err(AdaptorError::InvalidConfig {
                        field: "classification.collection".to_string(),
                        reason: format!(
                            "'{}' is not a valid table name",
                            self.classification.collection
                        ),
                    });
                }
            },
            SourceKind::Csv => {
                let has_path = self
                    .classification
                    .csv_path
                    .as_deref()
                    .is_some_and(|p| !p.trim().is_empty());
                if !has_path {
                    return Err(AdaptorError::MissingConfig(
                        "classification.csv_path".to_string(),
                    ));
                }
            },
            SourceKind::Builtin | SourceKind::None => {},
        }

        self.api.socket_addr()?;
        Ok(())
    }
}

/// ASCII letters, digits and `_`, not starting with a digit
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
