//! Part classification lookup
//!
//! Maps a device/part code to its integer classification ("part type").
//! The map is built once before the listener binds and is read-only
//! afterwards, so handlers share it through an `Arc` without locking.

mod csv_source;
mod database;

use std::collections::HashMap;

use errors::{AdaptorError, AdaptorResult};
use tracing::info;

use crate::config::{ClassificationConfig, SourceKind};

pub use csv_source::{load_builtin, load_csv_file, parse_csv};
pub use database::{load_from_database, load_from_pool, PartEntry};

/// Lookup used by the normalizer
pub trait Classifier: Send + Sync {
    /// Classification of `code`; unknown codes yield the default
    fn classify(&self, code: &str) -> i32;

    /// Number of known codes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory code → classification table with a fallback value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationMap {
    entries: HashMap<String, i32>,
    default_part_type: i32,
}

impl ClassificationMap {
    pub fn new(default_part_type: i32) -> Self {
        Self {
            entries: HashMap::new(),
            default_part_type,
        }
    }

    /// Build from `(code, classification)` pairs; later pairs overwrite earlier ones
    pub fn from_entries<I, K>(entries: I, default_part_type: i32) -> Self
    where
        I: IntoIterator<Item = (K, i32)>,
        K: Into<String>,
    {
        let mut map = Self::new(default_part_type);
        for (code, part_type) in entries {
            map.insert(code, part_type);
        }
        map
    }

    /// Last write wins
    pub fn insert(&mut self, code: impl Into<String>, part_type: i32) {
        self.entries.insert(code.into(), part_type);
    }

    /// Explicit entry for `code`, without falling back
    pub fn get(&self, code: &str) -> Option<i32> {
        self.entries.get(code).copied()
    }

    pub fn default_part_type(&self) -> i32 {
        self.default_part_type
    }
}

impl Classifier for ClassificationMap {
    fn classify(&self, code: &str) -> i32 {
        self.get(code).unwrap_or(self.default_part_type)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Build the classification map from the configured source
///
/// Any failure here is a startup failure: the service must not serve
/// with a partial table.
pub async fn load_classification_map(
    config: &ClassificationConfig,
) -> AdaptorResult<ClassificationMap> {
    let default = config.default_part_type;

    let (map, origin) = match config.source {
        SourceKind::Database => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                AdaptorError::MissingConfig("classification.database_url".to_string())
            })?;
            let map = load_from_database(url, &config.collection, default).await?;
            (map, format!("table {}", config.collection))
        },
        SourceKind::Csv => {
            let path = config.csv_path.as_deref().ok_or_else(|| {
                AdaptorError::MissingConfig("classification.csv_path".to_string())
            })?;
            (load_csv_file(path, default)?, path.to_string())
        },
        SourceKind::Builtin => (load_builtin(default)?, "builtin table".to_string()),
        SourceKind::None => (ClassificationMap::new(default), "none".to_string()),
    };

    info!(
        "Classification loaded: {} entries from {} (default part type {})",
        map.len(),
        origin,
        default
    );
    Ok(map)
}
