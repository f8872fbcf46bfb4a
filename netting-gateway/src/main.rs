//! Netting gateway entry point
//!
//! Reference deployment: wires the in-memory agreement repository,
//! subledger adapters, and settlement store behind the HTTP surface.
//! Production deployments swap the adapters for clients of the real
//! AR/AP subledger services.

use netting_core::{
    Config, InMemoryAgreementRepository, InMemoryApLedger, InMemoryArLedger,
    InMemorySettlementStore, NettingService,
};
use netting_gateway::{router, AppState};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::from_env()?;
    info!("Starting {} v{}", config.service_name, config.service_version);

    let service = NettingService::new(
        Arc::new(InMemoryAgreementRepository::new()),
        Arc::new(InMemoryArLedger::new()),
        Arc::new(InMemoryApLedger::new()),
        Arc::new(InMemorySettlementStore::new()),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(AppState {
        service: Arc::new(service),
    })
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Gateway listening on: {}", config.listen_addr);
    info!("   GET  /agreements              - List netting agreements");
    info!("   POST /agreements              - Create netting agreement");
    info!("   GET  /agreements/:id/proposal - Compute fresh netting proposal");
    info!("   POST /settlements             - Execute settlement");
    info!("   GET  /settlements/:id         - Settlement record");
    info!("   GET  /health                  - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
