//! SQLite-backed classification source
//!
//! Each row of the collection table is one document; its `datas` column holds
//! a JSON array of `{"partCode": "...", "partType": n}` entries.

use std::str::FromStr;

use errors::{AdaptorError, AdaptorResult};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, error};

use super::ClassificationMap;
use crate::config::is_valid_identifier;

/// One entry of a document's `datas` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartEntry {
    pub part_code: String,
    pub part_type: i32,
}

/// Connect to `database_url` and read every document of `collection`
///
/// The database must already exist; a missing file is reported as
/// unreachable instead of silently creating an empty one.
pub async fn load_from_database(
    database_url: &str,
    collection: &str,
    default_part_type: i32,
) -> AdaptorResult<ClassificationMap> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AdaptorError::Database(format!("invalid database url: {}", e)))?
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Classification DB unreachable: {}", e);
            AdaptorError::Database(format!("cannot open {}: {}", database_url, e))
        })?;

    let result = load_from_pool(&pool, collection, default_part_type).await;
    pool.close().await;
    result
}

/// Read every document of `collection` in insertion order
pub async fn load_from_pool(
    pool: &SqlitePool,
    collection: &str,
    default_part_type: i32,
) -> AdaptorResult<ClassificationMap> {
    if !is_valid_identifier(collection) {
        return Err(AdaptorError::InvalidConfig {
            field: "classification.collection".to_string(),
            reason: format!("'{}' is not a valid table name", collection),
        });
    }

    let query = format!(r#"SELECT rowid, datas FROM "{}" ORDER BY rowid"#, collection);
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    debug!("Classification docs: {}", rows.len());

    let mut map = ClassificationMap::new(default_part_type);
    for row in rows {
        let rowid: i64 = row.try_get(0)?;
        let datas: Option<String> = row.try_get(1)?;
        let location = format!("{} rowid {}", collection, rowid);

        let raw = datas.ok_or_else(|| AdaptorError::InvalidSource {
            location: location.clone(),
            reason: "datas is null".to_string(),
        })?;
        let entries: Vec<PartEntry> =
            serde_json::from_str(&raw).map_err(|e| AdaptorError::InvalidSource {
                location,
                reason: e.to_string(),
            })?;

        for entry in entries {
            map.insert(entry.part_code, entry.part_type);
        }
    }

    Ok(map)
}
