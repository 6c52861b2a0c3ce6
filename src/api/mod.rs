pub mod error;
pub mod health;
pub mod resolve;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::plugins::ProviderRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
}

impl AppState {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// 构建所有路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Image Resolver API v1.0" }))
        // Health
        .route("/api/health", get(health::health_check))
        .route("/api/cache/clear", post(health::clear_cache))
        // Resolve
        .route("/api/services", get(resolve::list_services))
        .route("/api/resolve", get(resolve::resolve_uri))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
