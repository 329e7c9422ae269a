// Recipe Share - Web Server
// REST API with Axum over the SQLite store

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use recipe_share::api::{router, AppState};
use recipe_share::{init_logging, open_database, Config, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("Recipe Share server v{VERSION}");

    let config = Config::load()?;
    let conn = open_database(&config.database_path)?;
    let app = router(AppState::new(conn));

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;

    info!("Server running on http://{address}");
    info!("API: http://{address}/api/recipes/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
