use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use docquery::{config::Config, llm::openai::OpenAIAdapter, routes::create_router, utils::init_logger, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        server = ?config.server,
        model = %config.llm.model,
        api_base = %config.llm.api_base,
        "Configuration loaded"
    );

    let client = OpenAIAdapter::new(&config.llm).context("Failed to create completion client")?;

    // Create shared state
    let state = AppState {
        config: config.clone(),
        client: Arc::new(client),
    };

    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
