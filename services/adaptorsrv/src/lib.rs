//! adaptorsrv - fire-alarm webhook adaptor
//!
//! Receives device event webhooks, resolves the device's part type from a
//! lookup table loaded at startup, derives alarm/fault flags and forwards the
//! normalized record to a single downstream endpoint.

pub mod api;
pub mod app_state;
pub mod bootstrap;
pub mod classification;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod models;
pub mod normalizer;
pub mod routes;

pub use app_state::AppState;
pub use classification::{ClassificationMap, Classifier};
pub use forwarder::{Forwarder, HttpForwarder};
pub use models::{DownstreamAck, InboundEvent, NormalizedRecord};
pub use routes::create_routes;
