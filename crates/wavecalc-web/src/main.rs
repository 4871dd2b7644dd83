//! wavecalc web server
//!
//! Run with: cargo run -p wavecalc-web

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wavecalc_config::Config;
use wavecalc_web::router::build_router;
use wavecalc_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wavecalc_web=debug,wavecalc_reactive=debug,info")),
        )
        .init();

    info!("Starting wavecalc web server...");

    let config = Config::load()?;
    let addr = config.server.bind;
    let state = AppState::new(config);
    let shutdown = state.shutdown.clone();

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    info!("Pipeline page at http://{}/panel/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C after cancelling `token`, so open sockets close
/// before the server waits on them.
async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    token.cancel();
}
