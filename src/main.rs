use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use product_page_generator::{
    gemini::{GeminiClient, TextGenerator},
    generation::ModelCopyService,
    jobs::JobQueue,
    notify::Notifier,
    router,
    scrape::{HttpScraper, ProductScraper},
    AppConfig, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    let key = &config.gemini_api_key;
    tracing::info!("Using API key: {}...", &key[..key.len().min(10)]);
    if config.allowed_domains.is_empty() {
        tracing::warn!("⚠️ ALLOWED_DOMAINS is empty, scrape jobs will be rejected");
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gemini_model.clone(),
        config.request_timeout,
    ));
    let scraper: Arc<dyn ProductScraper> =
        Arc::new(HttpScraper::new(config.scrape_timeout).context("building scrape client")?);
    let notifier = Notifier::new(config.toast_ttl);
    let jobs = JobQueue::start(
        config.worker_concurrency,
        config.job_history,
        config.allowed_domains.clone(),
        scraper.clone(),
        generator.clone(),
        notifier.clone(),
    );

    let state = AppState {
        store: Arc::default(),
        generator: generator.clone(),
        copy_service: Arc::new(ModelCopyService::new(generator)),
        scraper,
        jobs: jobs.clone(),
        notifier: notifier.clone(),
        request_timeout: config.request_timeout,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "Starting server");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    jobs.shutdown().await;
    notifier.shutdown();
    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
