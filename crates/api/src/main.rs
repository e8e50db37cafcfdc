use anyhow::Context;

use finanzas_api::config::AppConfig;
use finanzas_store::CollectionWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    finanzas_observability::init(config.log_format);

    let (app, services) = finanzas_api::app::build_app(&config).context("failed to wire services")?;

    // Keeps the live collections of the hosted store fresh while serving.
    let _watcher = config
        .remote_store
        .as_ref()
        .map(|remote| CollectionWatcher::spawn(services.store.clone(), services.household, remote.poll_interval));
    let _debt_updates = services.store.live(services.household).debts.subscribe(|snap| {
        let open = snap.items().iter().filter(|d| d.is_active()).count();
        tracing::info!(version = snap.version(), debts = snap.len(), open, "debts updated");
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, household = %services.household, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
