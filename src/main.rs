use anyhow::Context;
use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::AppConfig;
use todo_api::http::routing::{self, todos};
use todo_api::infrastructure::build_repository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    tracing::info!(storage = ?config.storage, "configuration loaded");

    let repo = build_repository(&config.storage).await.context("initialising repository")?;
    let service = TodoServiceImpl::new(repo);
    let router = routing::app(todos::router(todos::AppState::new(service)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
