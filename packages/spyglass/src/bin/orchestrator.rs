// Entry point for the monitoring loop.

use anyhow::{Context, Result};
use clap::Parser;
use ollama_client::OllamaClient;
use spyglass_core::config::Config;
use spyglass_core::fetcher::HttpFetcher;
use spyglass_core::notifier::SmtpNotifier;
use spyglass_core::orchestrator::Orchestrator;
use spyglass_core::storage::SupabaseStorage;
use spyglass_core::summarizer::OllamaSummarizer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "orchestrator", about = "Competitor page monitoring loop")]
struct Args {
    /// Run a single batch and exit.
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spyglass_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let storage = SupabaseStorage::new(&config.supabase_url, &config.supabase_service_role_key)
        .context("Failed to create storage client")?;
    let fetcher = HttpFetcher::new().context("Failed to create page fetcher")?;
    let summarizer = OllamaSummarizer::new(
        OllamaClient::new(config.ollama_url.clone()),
        config.ollama_model.clone(),
    );
    let notifier = SmtpNotifier::new(config.smtp_host.clone(), config.smtp_credentials());

    let orchestrator = Orchestrator::new(
        fetcher,
        summarizer,
        notifier,
        storage,
        config.job_delay,
        config.check_interval,
    );

    if args.test {
        let processed = orchestrator.run_once().await;
        tracing::info!(processed = processed, "Test cycle complete");
    } else {
        orchestrator.run_loop().await;
    }

    Ok(())
}
