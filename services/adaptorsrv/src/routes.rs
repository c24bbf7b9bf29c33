//! API Route Configuration

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::event_handlers::receive_event;
use crate::api::health_handlers::hello;
use crate::app_state::AppState;

/// Create all API routes
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/data", post(receive_event))
        // Apply HTTP request logging middleware
        .layer(axum::middleware::from_fn(common::logging::http_request_logger))
        .with_state(state)
}
