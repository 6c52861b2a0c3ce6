use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use super::error::ApiResult;
use super::response::{json_message, json_ok};
use super::AppState;

/// 健康检查端点
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let cache_entries = state.registry.cache().entry_count().await;

    Ok(json_ok(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.registry.providers().len(),
        "cache_entries": cache_entries
    })))
}

/// 清空所有缓存
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.registry.cache().invalidate_all().await;
    tracing::info!("Resolver cache cleared");

    Ok(json_message("All caches cleared"))
}
