//! Shared service plumbing for the adaptor workspace
//!
//! Provides the pieces every service binary needs:
//! - logging (console + rolling JSON log file, HTTP access logging)
//! - service bootstrap (banner, `.env` loading, logging settings)
//! - graceful shutdown

pub mod logging;
pub mod service_bootstrap;
pub mod shutdown;

pub use service_bootstrap::ServiceInfo;
