use std::sync::Arc;

use tracing::info;

use cloudgate_gateway_server::config::GatewayConfig;
use cloudgate_gateway_server::{create_app, AppState};
use cloudgate_providers::{MemoryEc2Api, MemoryGcpApi};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,cloudgate_gateway_server=debug".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = GatewayConfig::from_env()?;

    // In-memory backends; swap in SDK-backed GcpComputeApi / Ec2Api
    // implementations to drive real projects and accounts.
    let state = AppState::new(
        &config,
        Arc::new(MemoryGcpApi::new()),
        Arc::new(MemoryEc2Api::new()),
    );
    let app = create_app(state);

    info!(listen = %config.listen, "cloud instance gateway listening");
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
