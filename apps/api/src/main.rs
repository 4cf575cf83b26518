use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
use tailor_api::config::Config;
use tailor_api::llm::{AnthropicClient, ModelClient};
use tailor_api::report::ReportCoordinator;
use tailor_api::routes::build_router;
use tailor_api::state::AppState;
use tailor_api::tasks::DEFAULT_MODEL;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Report cache: Redis when configured, in-process otherwise
    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            info!("Redis report cache initialized");
            Arc::new(RedisCacheStore::new(client))
        }
        None => {
            info!("REDIS_URL not set, using in-process report cache");
            Arc::new(MemoryCacheStore::default())
        }
    };

    let llm: Arc<dyn ModelClient> = Arc::new(AnthropicClient::new(
        config.anthropic_api_key.clone(),
    )?);
    info!("LLM client initialized (model: {DEFAULT_MODEL})");

    let coordinator = Arc::new(ReportCoordinator::new(Arc::clone(&llm), cache));

    let state = AppState {
        llm,
        coordinator,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
