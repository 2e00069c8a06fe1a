use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use flashgen_core::orchestration::TaskManager;
use flashgen_core::persistence::JsonFileTaskStore;
use flashgen_core::registry::StrategyRegistry;
use flashgen_server::config::ServerConfig;
use flashgen_server::routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let registry = StrategyRegistry::builtin()?;
    tracing::info!(strategies = ?registry.names(), "strategy registry ready");

    let store = Arc::new(JsonFileTaskStore::new(&config.data_dir)?);
    let manager = Arc::new(TaskManager::with_max_workers(
        registry,
        store,
        config.max_workers,
    ));

    let app = routes::router(manager);
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "flashgen listening");
    axum::serve(listener, app).await?;
    Ok(())
}
