//! adaptorsrv entry point

use adaptorsrv::bootstrap::{self, Args};
use adaptorsrv::create_routes;
use clap::Parser;
use common::service_bootstrap::load_env_file;
use common::shutdown::wait_for_shutdown;
use errors::AdaptorError;
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    // Environment must be settled before the runtime spawns worker threads;
    // .env never overrides variables that are already set
    let env_loaded = load_env_file(".env");
    let args = Args::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args, env_loaded))
}

async fn run(args: Args, env_loaded: bool) -> anyhow::Result<()> {
    let config = bootstrap::load_configuration(&args)?;
    let service_info = bootstrap::create_service_info(&config);
    bootstrap::init_environment(&service_info, &config, !args.no_color)?;
    debug!(".env loaded: {}", env_loaded);

    // Classification must be complete before the listener binds
    let state = bootstrap::build_state(&config).await?;

    if args.validate {
        info!("Configuration valid");
        return Ok(());
    }

    let addr = config.api.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AdaptorError::StartupFailed(format!("bind {}: {}", addr, e)))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, create_routes(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("{} stopped", service_info.name);
    Ok(())
}
