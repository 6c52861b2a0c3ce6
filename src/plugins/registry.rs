//! 插件注册表
//!
//! 按注册顺序保存插件，输入 URL 时选择第一个正则匹配的插件并调用其解析器

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::resolvers::{
    default_providers, ImageInfo, PatternMatch, PatternProvider, ResolveError, ResolverContext,
};
use crate::services::ResolverCache;

/// 注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No provider supports URI: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// 插件信息（对外展示）
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub pattern: String,
}

/// 一次解析的结果
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub service_id: String,
    pub service_name: String,
    pub images: Vec<ImageInfo>,
}

/// 插件注册表
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn PatternProvider>>,
    context: ResolverContext,
}

impl ProviderRegistry {
    /// 创建空注册表
    pub fn new(context: ResolverContext) -> Self {
        Self {
            providers: Vec::new(),
            context,
        }
    }

    /// 创建包含所有内置插件的注册表
    pub fn with_default_providers(context: ResolverContext) -> Self {
        let mut registry = Self::new(context);
        for provider in default_providers() {
            registry.register(provider);
        }
        info!("Registered {} providers", registry.providers.len());
        registry
    }

    /// 追加插件，越早注册优先级越高
    pub fn register(&mut self, provider: Arc<dyn PatternProvider>) {
        debug!("Registered provider: {}", provider.service_id());
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<dyn PatternProvider>] {
        &self.providers
    }

    /// 获取插件信息列表
    pub fn provider_infos(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                id: p.service_id().to_string(),
                name: p.service_name().to_string(),
                pattern: p.pattern().to_string(),
            })
            .collect()
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.context.cache
    }

    /// 第一个匹配的插件及其捕获组
    pub fn find(&self, uri: &str) -> Option<(Arc<dyn PatternProvider>, PatternMatch)> {
        self.providers.iter().find_map(|provider| {
            provider
                .try_match(uri)
                .map(|pattern_match| (provider.clone(), pattern_match))
        })
    }

    /// 根据 URL 自动选择插件并解析
    pub async fn resolve(&self, uri: &str) -> Result<Resolution, RegistryError> {
        let (provider, pattern_match) = self
            .find(uri)
            .ok_or_else(|| RegistryError::Unsupported(uri.to_string()))?;

        debug!("Auto-selected provider '{}' for URI '{}'", provider.service_id(), uri);

        let resolver = provider.resolver(&self.context);
        let images = resolver.get_images(&pattern_match).await?;

        Ok(Resolution {
            service_id: provider.service_id().to_string(),
            service_name: provider.service_name().to_string(),
            images,
        })
    }
}
