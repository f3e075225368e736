//! HTTP server for hypercal.
//!
//! Serves rewritten timetable calendars, either for a single feed described
//! in the query string or for the feeds of a registered preference.
//!
//! # Example
//!
//! ```rust,no_run
//! use hypercal_server::{ServerConfig, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     run(ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use tracing::{error, info};

use hypercal_feeds::HttpFeedFetcher;

pub use config::{ConfigError, DEFAULT_CONFIG_FILE, FeedSettings, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use routes::router;
pub use state::AppState;
pub use store::{PreferenceStore, StoreError};

/// Runs the server until SIGINT or SIGTERM.
///
/// # Errors
///
/// Fails when the preference store cannot be loaded or the address cannot
/// be bound.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let fetcher_config = config.feed.fetcher_config();
    let fetcher = HttpFeedFetcher::new(fetcher_config.clone())?;
    let store = PreferenceStore::open(&config.preferences_path).await?;
    let state = AppState::new(Arc::new(fetcher), fetcher_config, Arc::new(store));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
