//! 解析 API 端点

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::response::json_ok;
use super::AppState;

/// 解析请求参数
#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub uri: String,
}

/// 列出所有插件
pub async fn list_services(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(json_ok(state.registry.provider_infos()))
}

/// 解析图片页面 URL
pub async fn resolve_uri(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> ApiResult<impl IntoResponse> {
    let uri = params.uri.trim();
    validate_uri(uri)?;

    let resolution = state.registry.resolve(uri).await.map_err(|e| {
        warn!("Failed to resolve {}: {}", uri, e);
        ApiError::from(e)
    })?;

    info!(
        "Resolved {} via {} ({} images)",
        uri,
        resolution.service_id,
        resolution.images.len()
    );
    Ok(json_ok(resolution))
}

/// 只接受 http/https 的绝对 URL
fn validate_uri(uri: &str) -> ApiResult<()> {
    let parsed = url::Url::parse(uri)
        .map_err(|e| ApiError::BadRequest(format!("Invalid URI '{}': {}", uri, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ApiError::BadRequest(format!("Unsupported scheme: {}", scheme))),
    }
}
