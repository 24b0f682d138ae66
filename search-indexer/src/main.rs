//! Search Indexer Main Entry Point
//!
//! Runs the change-event ingest and the search HTTP API in one process.

use dotenv::dotenv;
use search_indexer::http::create_app;
use search_indexer::{Dependencies, IndexingError};
use std::env;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_indexer=info,search_repository=info"));

    if env::var("LOG_JSON").is_ok() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    info!(
        service_name = "search-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv().ok();
    init_tracing();

    info!("Starting hotel search indexer");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    // The search API runs alongside the ingest; when the orchestrator stops
    // the process is done and the server task goes with it.
    let app = create_app(deps.search_state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], deps.port));
    let server_handle = tokio::spawn(async move {
        info!(addr = %addr, "Search API listening");
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app).await {
                    error!(error = %e, "Search API server error");
                }
            }
            Err(e) => error!(error = %e, addr = %addr, "Failed to bind search API"),
        }
    });

    let result = deps.orchestrator.run().await;
    server_handle.abort();

    match result {
        Ok(()) => {
            info!("Search indexer completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Search indexer failed");
            Err(e.into())
        }
    }
}
