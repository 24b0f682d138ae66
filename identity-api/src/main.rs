//! Identity API Main Entry Point
//!
//! Wires the PostgreSQL user store, the two cache tiers and the HTTP
//! router, then serves until ctrl-c.

use dotenv::dotenv;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use identity_api::cache::{MemoryUserCache, RedisUserCache, UserCacheTier};
use identity_api::http::{create_app, AppState};
use identity_api::service::{UsersService, UsersServiceConfig};
use identity_api::storage::{PostgresUserStore, UserStore};
use identity_api::IdentityConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("identity_api=info"));

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
        service_name = "identity-api",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = IdentityConfig::from_env();
    info!(port = config.port, "Starting identity service");

    let store = PostgresUserStore::connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    store
        .ensure_schema()
        .await
        .map_err(|e| anyhow::anyhow!("failed to prepare schema: {e}"))?;
    let store: Arc<dyn UserStore> = Arc::new(store);

    let l1: Arc<dyn UserCacheTier> = Arc::new(MemoryUserCache::new(
        config.cache_max_capacity,
        config.cache_ttl,
    ));
    let l2: Arc<dyn UserCacheTier> = Arc::new(
        RedisUserCache::connect(&config.redis_url, config.cache_ttl)
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to Redis: {e}"))?,
    );

    let service = Arc::new(UsersService::new(
        store,
        l1,
        l2,
        UsersServiceConfig {
            bcrypt_cost: config.bcrypt_cost,
            jwt_secret: config.jwt_secret,
            token_duration: config.jwt_duration,
        },
    ));

    let app = create_app(AppState { service });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Identity API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
        })
        .await?;

    info!("Identity service stopped");
    Ok(())
}
