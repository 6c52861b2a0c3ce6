//! 图片解析插件
//!
//! 每个插件（provider）声明一个 URL 正则和一个解析器工厂：
//! 正则负责识别 URL 并捕获参数，解析器根据捕获的参数请求远端页面并提取图片地址

pub mod canon_image_gateway;
pub mod error;
pub mod photozou;
pub mod utils;

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::Arc;

use crate::services::{HtmlFetcher, ResolverCache};

pub use canon_image_gateway::{CanonImageGatewayProvider, CanonImageGatewayResolver};
pub use error::{ErrorKind, FetchError, ResolveError};
pub use photozou::{PhotozouProvider, PhotozouResolver};

/// 一张解析后的图片：原图、展示图、缩略图
///
/// 源站不区分尺寸时三个字段相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    full: String,
    display: String,
    thumbnail: String,
}

impl ImageInfo {
    pub fn new(
        full: impl Into<String>,
        display: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            full: full.into(),
            display: display.into(),
            thumbnail: thumbnail.into(),
        }
    }

    /// 三个尺寸都指向同一个地址
    pub fn same(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            full: uri.clone(),
            display: uri.clone(),
            thumbnail: uri,
        }
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }
}

/// 正则匹配得到的捕获组
///
/// 第 0 组是整个匹配；未参与匹配的可选组记为空字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    groups: Vec<String>,
}

impl PatternMatch {
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }

    pub fn from_captures(captures: &Captures<'_>) -> Self {
        let groups = captures
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        Self { groups }
    }

    /// 取第 `index` 组，越界时返回空字符串
    pub fn group(&self, index: usize) -> &str {
        self.groups.get(index).map(String::as_str).unwrap_or("")
    }
}

/// 解析器依赖：共享缓存 + 页面获取器
#[derive(Clone)]
pub struct ResolverContext {
    pub cache: ResolverCache,
    pub fetcher: Arc<dyn HtmlFetcher>,
}

impl ResolverContext {
    pub fn new(cache: ResolverCache, fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self { cache, fetcher }
    }
}

/// 解析器：把捕获参数转换成图片列表
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn get_images(&self, pattern_match: &PatternMatch) -> Result<Vec<ImageInfo>, ResolveError>;
}

/// 插件声明
///
/// 纯配置，构造没有副作用；`resolver` 可以被反复调用
pub trait PatternProvider: Send + Sync {
    /// 服务 ID，如 `CanonImageGateway`
    fn service_id(&self) -> &'static str;

    /// 展示名称
    fn service_name(&self) -> &'static str;

    /// 正则源字符串
    fn pattern(&self) -> &'static str;

    /// 编译后的正则（每个进程只编译一次）
    fn regex(&self) -> &'static Regex;

    /// 创建解析器
    fn resolver(&self, context: &ResolverContext) -> Box<dyn Resolver>;

    /// 匹配 URL，成功时返回捕获组
    fn try_match(&self, uri: &str) -> Option<PatternMatch> {
        self.regex()
            .captures(uri)
            .map(|captures| PatternMatch::from_captures(&captures))
    }
}

/// 内置插件，按字母顺序排列
pub fn default_providers() -> Vec<Arc<dyn PatternProvider>> {
    vec![
        Arc::new(CanonImageGatewayProvider),
        Arc::new(PhotozouProvider),
    ]
}
