//! CANON iMAGE GATEWAY
//!
//! 共享链接有两种形态：
//! - 单张图片：`/s/[t/|m/]<album>/<item>`，取页面的 og:image
//! - 相册：`/s/[t/|m/][album/]<album>`，取缩略图列表
//!
//! 原图地址每次访问都会变化，缓存后可能失效，所以单张图片只使用 og:image

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::{Arc, OnceLock};

use super::error::ResolveError;
use super::utils::{check_response_error, compile_pattern, fetch, og_image, select_attributes};
use super::{ImageInfo, PatternMatch, PatternProvider, Resolver, ResolverContext};
use crate::services::{HtmlFetcher, ResolverCache};

const BASE_URI: &str = "http://opa.cig2.imagegateway.net/s/";

/// 页面中表示“没有对应数据”的文字
const NO_DATA_MARKER: &str = "該当するデータはありません。";

/// 缓存键前缀
const CACHE_PREFIX: &str = "cig-";

/// 相册页面的缩略图列表
const ALBUM_ITEM_SELECTOR: &str = "#jsAlbumItemList img";

pub struct CanonImageGatewayProvider;

impl PatternProvider for CanonImageGatewayProvider {
    fn service_id(&self) -> &'static str {
        "CanonImageGateway"
    }

    fn service_name(&self) -> &'static str {
        "CANON iMAGE GATEWAY"
    }

    fn pattern(&self) -> &'static str {
        r"^https?://opa\.cig2\.imagegateway\.net/s/([tm]/)?(?:album/)?(\w+(?:/\w+)?)/?(?:\?.*)?(?:#.*)?$"
    }

    fn regex(&self) -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        compile_pattern(&PATTERN, self.pattern())
    }

    fn resolver(&self, context: &ResolverContext) -> Box<dyn Resolver> {
        Box::new(CanonImageGatewayResolver::new(context))
    }
}

/// 捕获的 ID 指向的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumTarget<'a> {
    /// `<album>/<item>`，单张图片
    Item(&'a str),
    /// `<album>`，整个相册
    Album(&'a str),
}

impl<'a> AlbumTarget<'a> {
    /// 包含 `/` 的是单张图片，否则是相册
    pub fn classify(id: &'a str) -> Self {
        if id.contains('/') {
            AlbumTarget::Item(id)
        } else {
            AlbumTarget::Album(id)
        }
    }
}

pub struct CanonImageGatewayResolver {
    cache: ResolverCache,
    fetcher: Arc<dyn HtmlFetcher>,
}

impl CanonImageGatewayResolver {
    pub fn new(context: &ResolverContext) -> Self {
        Self {
            cache: context.cache.clone(),
            fetcher: context.fetcher.clone(),
        }
    }

    pub fn cache_key(id: &str) -> String {
        format!("{}{}", CACHE_PREFIX, id)
    }

    pub fn image_uri(size: &str, id: &str) -> String {
        format!("{}{}{}", BASE_URI, size, id)
    }

    pub fn album_uri(size: &str, id: &str) -> String {
        format!("{}{}album/{}", BASE_URI, size, id)
    }

    async fn get_image(fetcher: Arc<dyn HtmlFetcher>, request_uri: String) -> Result<String, ResolveError> {
        let outcome = fetch(fetcher.as_ref(), &request_uri).await?;
        check_response_error(&outcome, &[NO_DATA_MARKER])?;

        Ok(extract_image(&outcome.body))
    }

    /// 只读取相册第一页
    ///
    /// 页面最多只包含 49 张，剩余部分需要 POST `/album/shareItemListParts`，这里不处理
    async fn get_album_thumbnails(
        fetcher: Arc<dyn HtmlFetcher>,
        request_uri: String,
    ) -> Result<Vec<String>, ResolveError> {
        let outcome = fetch(fetcher.as_ref(), &request_uri).await?;
        check_response_error(&outcome, &[NO_DATA_MARKER])?;

        Ok(extract_album_thumbnails(&outcome.body))
    }
}

#[async_trait]
impl Resolver for CanonImageGatewayResolver {
    async fn get_images(&self, pattern_match: &PatternMatch) -> Result<Vec<ImageInfo>, ResolveError> {
        let size = pattern_match.group(1);
        let id = pattern_match.group(2);
        let key = Self::cache_key(id);

        match AlbumTarget::classify(id) {
            AlbumTarget::Item(id) => {
                let uri: String = self
                    .cache
                    .get_or_compute(
                        &key,
                        Self::get_image(self.fetcher.clone(), Self::image_uri(size, id)),
                    )
                    .await?;
                Ok(vec![ImageInfo::same(uri)])
            }
            AlbumTarget::Album(id) => {
                let thumbnails: Vec<String> = self
                    .cache
                    .get_or_compute(
                        &key,
                        Self::get_album_thumbnails(self.fetcher.clone(), Self::album_uri(size, id)),
                    )
                    .await?;
                Ok(thumbnails.into_iter().map(ImageInfo::same).collect())
            }
        }
    }
}

fn album_item_selector() -> &'static Selector {
    static ALBUM_ITEM: OnceLock<Selector> = OnceLock::new();
    ALBUM_ITEM.get_or_init(|| Selector::parse(ALBUM_ITEM_SELECTOR).expect("相册选择器解析失败"))
}

/// 单张图片页面：og:image，没有时为空字符串
fn extract_image(body: &str) -> String {
    og_image(&Html::parse_document(body))
}

/// 相册页面：按文档顺序读取缩略图的 src
fn extract_album_thumbnails(body: &str) -> Vec<String> {
    select_attributes(&Html::parse_document(body), album_item_selector(), "src")
}
