use anyhow::Context;

use stockwatch_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockwatch_observability::init_from_env();

    let config = AppConfig::from_env();
    if config.alert_recipients.is_empty() {
        tracing::warn!("STOCKWATCH_ALERT_RECIPIENTS not set; low-stock alerts will only be logged");
    }
    let bind_addr = config.bind_addr;

    let (app, services) = stockwatch_api::app::build_app(config).context("failed to start services")?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    // Ledger state is not persisted; it ends with the process.
    services.shutdown();
    Ok(())
}
