use std::sync::Arc;

use anyhow::Context;
use sportwing_service::app::{cors_layer, router, AppState};
use sportwing_service::config::{load_service_config, ServiceConfig};
use sportwing_service::gateway::{PaymentProcessor, StripeProcessor, StubProcessor};
use sportwing_service::memory_store::MemoryStore;
use sportwing_service::pg_store::PgDocumentStore;
use sportwing_service::store::DocumentStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    info!(?config, "loaded configuration");

    let store = build_store(&config).await?;
    let payments = build_payment_processor(&config);
    let state = AppState::new(
        store,
        config.jwt_config(),
        payments,
        config.payment_currency.clone(),
    )?;

    let app = router(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "SportWing is Running on Port: {}", addr.port());
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgDocumentStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.migrate().await?;
            info!("connected to document store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("dev mode: DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_payment_processor(config: &ServiceConfig) -> Arc<dyn PaymentProcessor> {
    match &config.payment_secret_key {
        Some(secret) => {
            info!(api_base = %config.payment_api_base, "Configuring payment processor");
            Arc::new(StripeProcessor::with_base_url(
                reqwest::Client::new(),
                secret.clone(),
                config.payment_api_base.clone(),
            ))
        }
        None => {
            warn!("dev mode: PAYMENT_SECRET_KEY not set, payment intents are stubbed");
            Arc::new(StubProcessor::new())
        }
    }
}
