//! Gateway entry point: loads settings, wires adapters and serves HTTP.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use headshot_backend::config::GatewaySettings;
use headshot_backend::inbound::http::health::HealthState;

use server::{build_server_config, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        GatewaySettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let config = build_server_config(&settings).await?;
    let bind_addr = config.bind_addr;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "headshot gateway listening");

    let handle = server.handle();
    let drain_state = health_state.clone();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            drain_state.mark_unhealthy();
            handle.stop(true).await;
        }
    });

    server.await.wrap_err("HTTP server failed")
}
