//! Liveness probe

#![allow(clippy::disallowed_methods)] // json! macro

use axum::response::Json;
use serde_json::{json, Value};

/// @route GET /
/// @output `{"hello":"world"}`
pub async fn hello() -> Json<Value> {
    Json(json!({ "hello": "world" }))
}
