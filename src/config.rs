// 配置 - 解析服务的运行参数
//
// 加载顺序：
// 1. 默认值
// 2. JSON 配置文件（RESOLVER_CONFIG_PATH，可选）
// 3. 环境变量覆盖

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::services::ResolverCache;

/// 解析服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// 缓存最大条目数
    pub cache_max_capacity: u64,

    /// 缓存过期时间（秒）
    pub cache_ttl_secs: u64,

    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,

    /// 请求时使用的 User-Agent
    pub user_agent: String,

    /// 监听地址
    pub host: String,

    /// 监听端口
    pub port: u16,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_max_capacity: ResolverCache::DEFAULT_MAX_CAPACITY,
            cache_ttl_secs: ResolverCache::DEFAULT_TTL.as_secs(),
            http_timeout_secs: 30,
            user_agent: format!("img_resolver/{}", env!("CARGO_PKG_VERSION")),
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ResolverConfig {
    /// 配置文件路径的环境变量名
    pub const CONFIG_PATH_ENV: &'static str = "RESOLVER_CONFIG_PATH";

    /// 从配置文件和环境变量加载
    ///
    /// - 配置文件不存在：使用默认值
    /// - 配置文件损坏：记录警告并使用默认值
    pub async fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path
            .or_else(|| std::env::var(Self::CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match config_path {
            Some(path) => Self::from_file(&path).await?,
            None => {
                info!("No config file specified, using defaults");
                Self::default()
            }
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(e) => {
                warn!("Config file {:?} is corrupted, using defaults: {}", path, e);
                Ok(Self::default())
            }
        }
    }

    /// 用环境变量覆盖配置，无法解析的值会被忽略
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "RESOLVER_CACHE_CAPACITY", &mut self.cache_max_capacity);
        override_parsed(&lookup, "RESOLVER_CACHE_TTL_SECS", &mut self.cache_ttl_secs);
        override_parsed(&lookup, "RESOLVER_HTTP_TIMEOUT_SECS", &mut self.http_timeout_secs);
        override_parsed(&lookup, "PORT", &mut self.port);

        if let Some(user_agent) = lookup("RESOLVER_USER_AGENT") {
            self.user_agent = user_agent;
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
    }

    /// 监听地址字符串，如 `0.0.0.0:3000`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring invalid value for {}: {:?}", name, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.cache_max_capacity, 10_000);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.cache_max_capacity, ResolverCache::DEFAULT_MAX_CAPACITY);
        assert_eq!(config.cache_ttl_secs, ResolverCache::DEFAULT_TTL.as_secs());
        assert!(config.user_agent.starts_with("img_resolver/"));
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let config = ResolverConfig::from_file(&path).await.unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolver.json");
        tokio::fs::write(&path, r#"{ "cache_ttl_secs": 60, "port": 8080 }"#)
            .await
            .unwrap();

        let config = ResolverConfig::from_file(&path).await.unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_max_capacity, 10_000);
    }

    #[tokio::test]
    async fn test_load_corrupted_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolver.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let config = ResolverConfig::from_file(&path).await.unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RESOLVER_CACHE_CAPACITY", "42"),
            ("RESOLVER_HTTP_TIMEOUT_SECS", "5"),
            ("RESOLVER_USER_AGENT", "test-agent"),
            ("HOST", "127.0.0.1"),
            ("PORT", "not-a-port"),
        ]);

        let mut config = ResolverConfig::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.cache_max_capacity, 42);
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.host, "127.0.0.1");
        // 无效值被忽略
        assert_eq!(config.port, 3000);
    }
}
