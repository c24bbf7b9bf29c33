//! Webhook intake: bind, normalize, forward, log

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use errors::{bad_request, AdaptorError};
use tracing::{error, info};

use crate::app_state::AppState;
use crate::config::ForwardFailurePolicy;
use crate::models::InboundEvent;
use crate::normalizer::normalize;

/// Receive one device event and forward its normalized record
///
/// The body is parsed as JSON whatever the declared content type, so a
/// malformed payload always answers 400 and never reaches the downstream.
///
/// @route POST /data
/// @input InboundEvent `{data: {device_id, event_type, ..}, dataCode, postTime}`
/// @output 204 on success; 400 bad body or fields; 502/504 downstream failure
/// @side-effects one POST to the downstream endpoint
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Result<StatusCode, AdaptorError> {
    let path = uri.path();

    let event = match InboundEvent::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            info!("{} bind failed: {}", path, e);
            return Err(bad_request!("invalid event body: {}", e));
        },
    };

    let record = normalize(&event, state.classifier.as_ref()).map_err(|e| {
        info!("{} normalize failed: {}", path, e);
        AdaptorError::from(e)
    })?;

    let data = serde_json::to_string(&event).unwrap_or_default();

    match state.forwarder.forward(&record).await {
        Ok(ack) => {
            info!(data = %data, res = %ack.json_field(), "{}", path);
            Ok(StatusCode::NO_CONTENT)
        },
        Err(e) => {
            error!(
                data = %data,
                endpoint = %state.forwarder.endpoint(),
                code = e.error_code(),
                "{} forward failed: {}",
                path,
                e
            );
            match state.on_forward_error {
                ForwardFailurePolicy::Reject => Err(e),
                ForwardFailurePolicy::Accept => Ok(StatusCode::NO_CONTENT),
            }
        },
    }
}
