pub mod html_fetcher;
pub mod resolver_cache;

pub use html_fetcher::{FetchOutcome, HtmlFetcher, ReqwestFetcher};
pub use resolver_cache::{CacheValue, CachedValue, ResolverCache};
