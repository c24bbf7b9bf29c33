//! CSV-backed classification sources
//!
//! Format: header `part_code,part_type`, one code per line. Extra columns are
//! ignored. Lines starting with `#` are comments, so a part code cannot begin
//! with `#`. The builtin table uses the same format and is compiled in.

use std::io::Read;
use std::path::Path;

use errors::{AdaptorError, AdaptorResult};
use serde::Deserialize;
use tracing::debug;

use super::ClassificationMap;

const BUILTIN_TABLE: &str = include_str!("builtin_part_types.csv");

#[derive(Debug, Deserialize)]
struct CsvRow {
    part_code: String,
    part_type: i32,
}

/// Parse CSV rows from any reader
pub fn parse_csv<R: Read>(reader: R, default_part_type: i32) -> AdaptorResult<ClassificationMap> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut map = ClassificationMap::new(default_part_type);
    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        map.insert(row.part_code, row.part_type);
    }
    Ok(map)
}

/// Load a CSV file from disk
pub fn load_csv_file(
    path: impl AsRef<Path>,
    default_part_type: i32,
) -> AdaptorResult<ClassificationMap> {
    let path = path.as_ref();
    debug!("Classification CSV: {}", path.display());

    let file = std::fs::File::open(path).map_err(|e| AdaptorError::InvalidSource {
        location: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_csv(file, default_part_type)
}

/// Table shipped with the binary
pub fn load_builtin(default_part_type: i32) -> AdaptorResult<ClassificationMap> {
    parse_csv(BUILTIN_TABLE.as_bytes(), default_part_type)
}
