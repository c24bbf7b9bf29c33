//! Application state shared by every handler

use std::sync::Arc;

use crate::classification::Classifier;
use crate::config::ForwardFailurePolicy;
use crate::forwarder::Forwarder;

/// Read-only after startup; cloned into handlers through `Arc`
pub struct AppState {
    /// Part code → part type lookup
    pub classifier: Arc<dyn Classifier>,

    /// Downstream delivery
    pub forwarder: Arc<dyn Forwarder>,

    /// Response when the downstream fails
    pub on_forward_error: ForwardFailurePolicy,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        forwarder: Arc<dyn Forwarder>,
        on_forward_error: ForwardFailurePolicy,
    ) -> Self {
        Self {
            classifier,
            forwarder,
            on_forward_error,
        }
    }
}
