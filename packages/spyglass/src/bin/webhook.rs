// Entry point for the payment webhook listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use spyglass_core::config::Config;
use spyglass_core::server::{build_router, AppState};
use spyglass_core::storage::SupabaseStorage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spyglass_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let storage = SupabaseStorage::new(&config.supabase_url, &config.supabase_service_role_key)
        .context("Failed to create storage client")?;

    let app = build_router(AppState {
        storage: Arc::new(storage),
    });

    let addr = format!("0.0.0.0:{}", config.webhook_port);
    tracing::info!(addr = %addr, "Webhook listener starting");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind webhook address")?;

    axum::serve(listener, app).await.context("Webhook server error")?;

    Ok(())
}
