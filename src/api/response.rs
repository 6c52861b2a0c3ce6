// 成功响应的 JSON 外壳：`{ "success": true, "data": ... }` 或 `{ "success": true, "message": ... }`
// 失败响应由 `ApiError` 负责

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 携带解析结果或服务列表
    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// 没有数据的操作（如清空缓存）只返回一条说明
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn json_ok<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse::with_data(data)
}

pub fn json_message(message: impl Into<String>) -> ApiResponse<()> {
    ApiResponse::with_message(message)
}
