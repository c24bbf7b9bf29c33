//! Service Bootstrap and Initialization
//!
//! Command line, configuration, logging and state assembly.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use common::service_bootstrap::{init_logging, print_startup_banner, ServiceInfo};
use errors::{config_error, AdaptorResult};
use tracing::info;

use crate::app_state::AppState;
use crate::classification::{load_classification_map, Classifier};
use crate::config::AdaptorConfig;
use crate::forwarder::{Forwarder, HttpForwarder};

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Fire-alarm webhook adaptor")]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE", env = "ADAPTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address override (e.g. 127.0.0.1:8000 or :8000)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Load configuration and the classification source, then exit
    #[arg(long)]
    pub validate: bool,

    /// Disable ANSI colours on the console
    #[arg(long)]
    pub no_color: bool,
}

/// Service info for the startup banner
pub fn create_service_info(config: &AdaptorConfig) -> ServiceInfo {
    let description = config
        .service
        .description
        .clone()
        .unwrap_or_else(|| "Fire Alarm Webhook Adaptor".to_string());
    ServiceInfo::new(config.service.name.clone(), description, config.api.port)
        .with_version(env!("CARGO_PKG_VERSION"))
}

/// Load configuration and apply command line overrides
pub fn load_configuration(args: &Args) -> AdaptorResult<AdaptorConfig> {
    let mut config = AdaptorConfig::load(args.config.as_deref())?;

    if let Some(bind) = &args.bind {
        config.api.bind_address = Some(bind.clone());
        config.api.socket_addr()?;
    }

    Ok(config)
}

/// Initialize logging and print the banner
pub fn init_environment(
    service_info: &ServiceInfo,
    config: &AdaptorConfig,
    ansi: bool,
) -> AdaptorResult<()> {
    init_logging(service_info, &config.logging, ansi)
        .map_err(|e| config_error!("Failed to initialize logging: {}", e))?;

    print_startup_banner(service_info);
    info!("{} starting", service_info.name);
    Ok(())
}

/// Load the classification table and build the shared state
pub async fn build_state(config: &AdaptorConfig) -> AdaptorResult<Arc<AppState>> {
    let classifier: Arc<dyn Classifier> =
        Arc::new(load_classification_map(&config.classification).await?);

    let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new(&config.downstream)?);
    info!(
        "Downstream: {} (on error: {:?})",
        forwarder.endpoint(),
        config.downstream.on_error
    );

    Ok(Arc::new(AppState::new(
        classifier,
        forwarder,
        config.downstream.on_error,
    )))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::config::SourceKind;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "adaptorsrv",
            "--config",
            "adaptor.yaml",
            "--bind",
            ":9000",
            "--validate",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("adaptor.yaml")));
        assert_eq!(args.bind.as_deref(), Some(":9000"));
        assert!(args.validate);
        assert!(!args.no_color);
    }

    #[test]
    fn test_service_info_from_config() {
        let config = AdaptorConfig::default();
        let info = create_service_info(&config);
        assert_eq!(info.name, "adaptorsrv");
        assert_eq!(info.default_port, 8000);
    }

    #[tokio::test]
    async fn test_build_state() {
        let mut config = AdaptorConfig::default();
        config.classification.source = SourceKind::Builtin;
        config.downstream.endpoint_url = "http://127.0.0.1:9/fire".to_string();

        let state = build_state(&config).await.unwrap();
        assert!(!state.classifier.is_empty());
        assert_eq!(state.forwarder.endpoint(), "http://127.0.0.1:9/fire");
    }

    #[tokio::test]
    async fn test_build_state_fails_on_missing_source() {
        let mut config = AdaptorConfig::default();
        config.classification.source = SourceKind::Csv;
        config.classification.csv_path = Some("/nonexistent/parts.csv".to_string());
        config.downstream.endpoint_url = "http://127.0.0.1:9/fire".to_string();

        assert!(build_state(&config).await.is_err());
    }
}
