use kairnial_api::config::ApiConfig;
use kairnial_api::services::metrics::init_metrics;
use kairnial_api::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "kairnial-api",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    // Must be installed before any metric is recorded.
    init_metrics()?;

    let application = Application::build(config).await?;
    tracing::info!(port = application.port(), "kairnial-api started");

    application.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
