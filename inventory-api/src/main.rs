//! Inventory API Main Entry Point
//!
//! Wires the PostgreSQL store, the write-through cache, the change-event
//! publisher and the HTTP router, then serves until ctrl-c.

use dotenv::dotenv;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inventory_api::cache::{CacheConfig, InventoryCache};
use inventory_api::events::{KafkaChangePublisher, PublisherConfig};
use inventory_api::http::{create_app, AppState};
use inventory_api::service::{run_cache_rebuild, HotelsService};
use inventory_api::storage::{InventoryStore, PostgresInventoryStore};
use inventory_api::InventoryConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("inventory_api=info"));

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
        service_name = "inventory-api",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = InventoryConfig::from_env();
    info!(port = config.port, "Starting inventory service");

    let store = PostgresInventoryStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;
    let store: Arc<dyn InventoryStore> = Arc::new(store);

    let cache = Arc::new(InventoryCache::new(CacheConfig {
        max_capacity: config.cache_max_capacity,
        ttl: config.cache_ttl,
    }));

    let publisher = Arc::new(KafkaChangePublisher::new(PublisherConfig::new(
        config.kafka_broker.clone(),
        config.kafka_topic.clone(),
    )));
    if let Err(e) = publisher.ensure_connected().await {
        warn!(error = %e, "Initial bus connection failed; will reconnect on next publish");
    }

    let (shutdown_tx, _) = broadcast::channel(1);
    Arc::clone(&publisher).spawn_watcher(shutdown_tx.subscribe());

    tokio::spawn(run_cache_rebuild(
        Arc::clone(&store),
        Arc::clone(&cache),
        config.cache_rebuild_interval,
        shutdown_tx.subscribe(),
    ));

    let service = Arc::new(HotelsService::new(store, cache, publisher));
    let state = AppState {
        service,
        jwt_secret: Arc::new(config.jwt_secret),
    };

    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Inventory API listening");

    let shutdown = shutdown_tx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
            let _ = shutdown.send(());
        })
        .await?;

    info!("Inventory service stopped");
    Ok(())
}
