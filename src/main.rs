use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use cinema_booking::{
    build_router,
    cache::CacheService,
    config::Config,
    database::Database,
    init_tracing,
    redis_client::RedisClient,
    repositories::Repositories,
    services::notification,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.app);

    info!("Starting cinema booking API ({})", config.app.environment);

    let repos = if config.database.in_memory {
        warn!("Using the in-memory store, data is lost on restart");
        Repositories::in_memory()
    } else {
        let url = config
            .database
            .url
            .as_deref()
            .context("DATABASE_URL must be set unless database.in_memory is enabled")?;
        let db = Database::connect(url, &config.database)
            .await
            .context("failed to connect to database")?;
        db.migrate().await.context("failed to run migrations")?;
        Repositories::postgres(db)
    };

    let cache = match &config.redis.url {
        Some(url) => match RedisClient::new(url).await {
            Ok(redis) => {
                info!("Redis connected");
                CacheService::new(redis, &config.redis)
            }
            Err(e) => {
                warn!("Redis unavailable, running without cache: {:?}", e);
                CacheService::disabled()
            }
        },
        None => CacheService::disabled(),
    };

    let notifier = notification::from_config(&config.mail)?;
    let state: Arc<AppState> = AppState::new(config.clone(), repos, cache, notifier);

    if let Some(admin) = state.auth.ensure_admin(&config.admin).await? {
        info!("Admin account ready: {}", admin.email);
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("invalid listen address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
