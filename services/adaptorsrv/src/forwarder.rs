//! Downstream delivery of normalized records

use std::time::Duration;

use async_trait::async_trait;
use errors::{AdaptorError, AdaptorResult};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DownstreamConfig;
use crate::models::{DownstreamAck, NormalizedRecord};

/// Sends one record to the downstream service and returns its reply
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Single attempt, no retry
    async fn forward(&self, record: &NormalizedRecord) -> AdaptorResult<DownstreamAck>;

    /// Target URL, used in logs
    fn endpoint(&self) -> &str;
}

/// JSON-over-HTTP forwarder
pub struct HttpForwarder {
    endpoint: String,
    client: Client,
}

impl HttpForwarder {
    pub fn new(config: &DownstreamConfig) -> AdaptorResult<Self> {
        if config.endpoint_url.trim().is_empty() {
            return Err(AdaptorError::MissingConfig(
                "downstream.endpoint_url".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AdaptorError::StartupFailed(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint_url.trim().to_string(),
            client,
        })
    }

    fn send_error(&self, err: reqwest::Error) -> AdaptorError {
        if err.is_timeout() {
            AdaptorError::Timeout(self.endpoint.clone())
        } else {
            AdaptorError::DownstreamUnavailable {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, record: &NormalizedRecord) -> AdaptorResult<DownstreamAck> {
        debug!("POST {} part={}", self.endpoint, record.part_code);

        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Downstream status {} from {}", status, self.endpoint);
        }

        let body = response.bytes().await.map_err(|e| self.send_error(e))?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|e| AdaptorError::DownstreamResponse {
                endpoint: self.endpoint.clone(),
                reason: format!("status {}: {}", status, e),
            })?;

        Ok(DownstreamAck(value))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
