// HTML 获取 - 解析器访问远端站点的唯一出口
//
// 解析器只依赖 `HtmlFetcher` trait，生产环境使用基于 reqwest 的实现，
// 测试中可以替换为内存中的假实现

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::resolvers::error::FetchError;

/// 一次请求的结果：状态码 + 响应正文
///
/// 只在错误分类和内容提取之间短暂存在，不会被缓存
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: u16,
    pub body: String,
}

impl FetchOutcome {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 远端页面获取接口
///
/// 超时由实现方负责；非 2xx 状态码也要返回 `Ok`，交给调用方分类
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchOutcome, FetchError>;
}

/// 基于 reqwest 的 HTTP 获取器
///
/// 内部持有一个共享的 `Client`（自带连接池），每次请求结束后连接归还连接池
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// 根据配置创建获取器
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Network(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchOutcome { status, body })
    }
}
