//! Shared fixtures for adaptorsrv integration tests

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use adaptorsrv::config::ForwardFailurePolicy;
use adaptorsrv::{
    create_routes, AppState, ClassificationMap, DownstreamAck, Forwarder, NormalizedRecord,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use errors::{AdaptorError, AdaptorResult};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const TEST_ENDPOINT: &str = "http://downstream.test/fire";

/// In-process forwarder that records every record it receives
pub struct RecordingForwarder {
    records: Mutex<Vec<NormalizedRecord>>,
    fail: bool,
}

impl RecordingForwarder {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn records(&self) -> Vec<NormalizedRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, record: &NormalizedRecord) -> AdaptorResult<DownstreamAck> {
        self.records.lock().unwrap().push(record.clone());
        if self.fail {
            return Err(AdaptorError::DownstreamUnavailable {
                endpoint: TEST_ENDPOINT.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(DownstreamAck(json!({ "json": record })))
    }

    fn endpoint(&self) -> &str {
        TEST_ENDPOINT
    }
}

/// Lookup table used by the scenarios: `{"341": 1}`
pub fn scenario_map() -> ClassificationMap {
    ClassificationMap::from_entries([("341", 1)], 0)
}

pub fn test_router(
    forwarder: Arc<dyn Forwarder>,
    policy: ForwardFailurePolicy,
) -> Router {
    let state = AppState::new(Arc::new(scenario_map()), forwarder, policy);
    create_routes(Arc::new(state))
}

pub fn json_request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve `app` on an ephemeral loopback port; returns its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
