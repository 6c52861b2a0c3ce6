// 解析器错误类型定义
//
// 区分两类失败：
// - 内容不存在（NotFound）：远端明确表示没有该图片/相册
// - 临时获取失败（Fetch）：超时、连接错误、5xx 等，可由调用方稍后重试
//
// 两者都不会写入缓存

use thiserror::Error;

/// 解析操作的统一错误类型
///
/// 需要实现 `Clone`：moka 在合并并发请求时以 `Arc<ResolveError>` 把同一个错误分发给所有等待者
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("图片不存在")]
    NotFound,

    #[error("获取失败: {0}")]
    Fetch(#[from] FetchError),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 传输层错误（均视为临时失败）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("请求超时")]
    Timeout,

    #[error("HTTP 错误: 状态码 {0}")]
    HttpStatus(u16),
}

/// 错误种类，供外层决定展示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TransientFetchFailure,
    Parse,
    Internal,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NotFound => ErrorKind::NotFound,
            ResolveError::Fetch(_) => ErrorKind::TransientFetchFailure,
            ResolveError::Parse(_) => ErrorKind::Parse,
            ResolveError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound)
    }
}

// 实现从 reqwest::Error 到 FetchError 的转换
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_status() {
            match err.status() {
                Some(status) => FetchError::HttpStatus(status.as_u16()),
                None => FetchError::Network(err.to_string()),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Fetch(FetchError::from(err))
    }
}

impl From<quick_xml::Error> for ResolveError {
    fn from(err: quick_xml::Error) -> Self {
        ResolveError::Parse(err.to_string())
    }
}
