// 图片解析后端库
//
// 本库把第三方图床页面的 URL 解析为直接的图片地址，包括：
// - 插件（URL 正则 + 解析器）
// - 解析结果缓存
// - 页面获取
// - API 路由

pub mod api;
pub mod config;
pub mod plugins;
pub mod resolvers;
pub mod services;

pub use config::ResolverConfig;
pub use plugins::{ProviderRegistry, Resolution};
pub use resolvers::{ImageInfo, PatternMatch, PatternProvider, ResolveError, Resolver, ResolverContext};
pub use services::{HtmlFetcher, ResolverCache};
