use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use img_resolver::api::{self, AppState};
use img_resolver::services::ReqwestFetcher;
use img_resolver::{ProviderRegistry, ResolverCache, ResolverConfig, ResolverContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ResolverConfig::load(None).await?;

    // Shared cache and HTTP client
    let cache = ResolverCache::from_config(&config);
    let fetcher = ReqwestFetcher::new(&config).context("Failed to build HTTP client")?;
    let context = ResolverContext::new(cache, Arc::new(fetcher));

    let registry = ProviderRegistry::with_default_providers(context);
    let app = api::router(AppState::new(registry));

    let addr: SocketAddr = config.listen_addr().parse()?;
    tracing::info!("🚀 Server listening on {}", addr);
    tracing::info!(
        "📦 Cache capacity {} entries, TTL {}s",
        config.cache_max_capacity,
        config.cache_ttl_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
