// One-shot dependency probe: storage reachability and local model
// availability. Exits 0 when everything passes, 1 otherwise.

use std::process::ExitCode;

use ollama_client::OllamaClient;
use spyglass_core::config::Config;
use spyglass_core::storage::{Storage, SupabaseStorage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration is incomplete");
            return ExitCode::FAILURE;
        }
    };

    let storage_ok = check_storage(&config).await;
    let ollama_ok = check_ollama(&config).await;

    if storage_ok && ollama_ok {
        tracing::info!("All systems go");
        ExitCode::SUCCESS
    } else {
        tracing::error!("Health check failed");
        ExitCode::FAILURE
    }
}

async fn check_storage(config: &Config) -> bool {
    let storage = match SupabaseStorage::new(
        &config.supabase_url,
        &config.supabase_service_role_key,
    ) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create storage client");
            return false;
        }
    };

    match storage.count_jobs().await {
        Ok(count) => {
            tracing::info!(jobs = count, "Storage connection successful");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Storage connection failed");
            false
        }
    }
}

async fn check_ollama(config: &Config) -> bool {
    let client = OllamaClient::new(config.ollama_url.clone());

    match client.list_models().await {
        Ok(models) => {
            let names: Vec<_> = models.into_iter().map(|m| m.name).collect();
            if names.iter().any(|name| name == &config.ollama_model) {
                tracing::info!(model = %config.ollama_model, "Ollama is running and the model is available");
                true
            } else {
                tracing::error!(
                    model = %config.ollama_model,
                    available = ?names,
                    "Ollama is running but the configured model is missing"
                );
                false
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Ollama is not reachable");
            false
        }
    }
}
