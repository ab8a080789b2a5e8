use std::net::SocketAddr;

use prema_engine::config::Config;
use prema_engine::lmsr_api::{self, AppState};
use prema_engine::quote::QuoteEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,prema_engine=debug")),
        )
        .init();

    info!("starting pricing engine");

    let config = Config::from_env();
    config.log_config();

    let app = lmsr_api::router(AppState::new(QuoteEngine::new(config.pricing.clone())));

    // Bind to all interfaces in Docker
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "server listening");
    info!("endpoints: GET /health, GET /quote, GET /max_loss, GET /reltime");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
