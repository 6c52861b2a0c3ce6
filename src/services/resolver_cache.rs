// 解析结果缓存
//
// 进程内共享的键值缓存，保证：
// - 同一个键同时最多只有一个计算在执行，其余调用方等待并共享结果
// - 计算失败不会写入缓存，下一次调用会重新请求
// - 不同的键之间互不阻塞
//
// 底层使用 moka::future::Cache，按容量和 TTL 淘汰

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::resolvers::error::ResolveError;
use crate::resolvers::ImageInfo;

/// 缓存中保存的值
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// 单张图片 URL
    Single(String),
    /// 相册缩略图 URL 列表
    List(Vec<String>),
    /// 区分尺寸的完整图片信息
    Image(ImageInfo),
}

/// 可以存入 `ResolverCache` 的类型
pub trait CacheValue: Sized + Send + 'static {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl CacheValue for String {
    fn into_cached(self) -> CachedValue {
        CachedValue::Single(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Single(s) => Some(s),
            _ => None,
        }
    }
}

impl CacheValue for Vec<String> {
    fn into_cached(self) -> CachedValue {
        CachedValue::List(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl CacheValue for ImageInfo {
    fn into_cached(self) -> CachedValue {
        CachedValue::Image(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Image(info) => Some(info),
            _ => None,
        }
    }
}

/// 解析器共享缓存
///
/// 克隆开销很小，所有克隆共享同一份数据
#[derive(Clone)]
pub struct ResolverCache {
    inner: Cache<String, CachedValue>,
}

impl ResolverCache {
    /// 默认容量
    pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

    /// 默认过期时间（1 小时）
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config.cache_max_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        )
    }

    /// 读取缓存，未命中时执行 `compute` 并保存结果
    ///
    /// # 行为
    /// - 并发调用同一个键时只有一个 `compute` 被执行
    /// - `compute` 返回错误时不写入缓存，错误会分发给所有等待者
    /// - 计算在独立任务中运行，发起方被取消后计算继续，结果仍交给其他等待者
    pub async fn get_or_compute<T, F>(&self, key: &str, compute: F) -> Result<T, ResolveError>
    where
        T: CacheValue,
        F: Future<Output = Result<T, ResolveError>> + Send + 'static,
    {
        if let Some(value) = self.inner.get(key).await {
            debug!("Cache hit: {}", key);
            return Self::downcast(key, value);
        }

        let inner = self.inner.clone();
        let owned_key = key.to_string();
        let task = tokio::spawn(async move {
            inner
                .entry(owned_key)
                .or_try_insert_with(async move { compute.await.map(CacheValue::into_cached) })
                .await
                .map(|entry| (entry.is_fresh(), entry.into_value()))
                .map_err(|e: Arc<ResolveError>| (*e).clone())
        });

        let (fresh, value) = task
            .await
            .map_err(|e| ResolveError::Internal(format!("缓存计算任务异常: {}", e)))??;

        if fresh {
            debug!("Cache miss, stored: {}", key);
        } else {
            debug!("Cache hit after wait: {}", key);
        }

        Self::downcast(key, value)
    }

    fn downcast<T: CacheValue>(key: &str, value: CachedValue) -> Result<T, ResolveError> {
        T::from_cached(value)
            .ok_or_else(|| ResolveError::Internal(format!("缓存值类型不匹配: {}", key)))
    }

    #[cfg(test)]
    pub(crate) async fn get(&self, key: &str) -> Option<CachedValue> {
        self.inner.get(key).await
    }

    #[cfg(test)]
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// 清空所有缓存
    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    /// 当前条目数（先处理待执行的维护任务，结果才准确）
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

impl Default for ResolverCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CAPACITY, Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::error::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_compute_once_per_key() {
        let cache = ResolverCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let value: String = cache
                .get_or_compute("cig-a/b", async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("https://example.com/a.jpg".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "https://example.com/a.jpg");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = ResolverCache::default();

        let first: Result<String, _> = cache
            .get_or_compute("cig-x", async {
                Err(ResolveError::Fetch(FetchError::Timeout))
            })
            .await;
        assert!(matches!(first, Err(ResolveError::Fetch(FetchError::Timeout))));
        assert!(!cache.contains_key("cig-x"));

        let second: String = cache
            .get_or_compute("cig-x", async { Ok("ok".to_string()) })
            .await
            .unwrap();
        assert_eq!(second, "ok");
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let cache = ResolverCache::default();

        let result: Result<Vec<String>, _> = cache
            .get_or_compute("cig-gone", async { Err(ResolveError::NotFound) })
            .await;
        assert!(matches!(result, Err(ResolveError::NotFound)));
        assert!(cache.get("cig-gone").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_compute() {
        let cache = ResolverCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("cig-album", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(vec!["a".to_string(), "b".to_string()])
                    })
                    .await
            }));
        }

        for handle in handles {
            let value: Vec<String> = handle.await.unwrap().unwrap();
            assert_eq!(value, vec!["a".to_string(), "b".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn slow_value(calls: Arc<AtomicUsize>) -> impl Future<Output = Result<String, ResolveError>> {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("v".to_string())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_caller_does_not_restart_compute() {
        let cache = ResolverCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.get_or_compute("cig-k", slow_value(calls)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiter = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.get_or_compute("cig-k", slow_value(calls)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        let value: String = waiter.await.unwrap().unwrap();
        assert_eq!(value, "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains_key("cig-k"));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_internal_error() {
        let cache = ResolverCache::default();
        let _: String = cache
            .get_or_compute("k", async { Ok("v".to_string()) })
            .await
            .unwrap();

        let result: Result<Vec<String>, _> =
            cache.get_or_compute("k", async { Ok(Vec::new()) }).await;
        assert!(matches!(result, Err(ResolveError::Internal(_))));
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = ResolverCache::default();
        let _: String = cache
            .get_or_compute("k", async { Ok("v".to_string()) })
            .await
            .unwrap();
        assert_eq!(cache.entry_count().await, 1);

        cache.invalidate_all().await;
        assert_eq!(cache.entry_count().await, 0);
    }
}
