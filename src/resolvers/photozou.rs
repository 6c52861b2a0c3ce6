//! フォト蔵 (photozou.jp)
//!
//! 通过公开的 `photo_info` XML 接口获取原图、展示图和缩略图

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::error::ResolveError;
use super::utils::{check_response_error, compile_pattern, fetch};
use super::{ImageInfo, PatternMatch, PatternProvider, Resolver, ResolverContext};
use crate::services::{HtmlFetcher, ResolverCache};

const API_URI: &str = "http://api.photozou.jp/rest/photo_info?photo_id=";

const CACHE_PREFIX: &str = "photozou-";

pub struct PhotozouProvider;

impl PatternProvider for PhotozouProvider {
    fn service_id(&self) -> &'static str {
        "Photozou"
    }

    fn service_name(&self) -> &'static str {
        "フォト蔵"
    }

    fn pattern(&self) -> &'static str {
        r"(?i)^https?://(?:www\.)?photozou\.jp/photo/(?:show|photo_only)/\d+/(\d+)/?(?:\?.*)?$"
    }

    fn regex(&self) -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        compile_pattern(&PATTERN, self.pattern())
    }

    fn resolver(&self, context: &ResolverContext) -> Box<dyn Resolver> {
        Box::new(PhotozouResolver::new(context))
    }
}

pub struct PhotozouResolver {
    cache: ResolverCache,
    fetcher: Arc<dyn HtmlFetcher>,
}

impl PhotozouResolver {
    pub fn new(context: &ResolverContext) -> Self {
        Self {
            cache: context.cache.clone(),
            fetcher: context.fetcher.clone(),
        }
    }

    pub fn photo_info_uri(id: &str) -> String {
        format!("{}{}", API_URI, id)
    }

    async fn get_photo_info(fetcher: Arc<dyn HtmlFetcher>, request_uri: String) -> Result<ImageInfo, ResolveError> {
        let outcome = fetch(fetcher.as_ref(), &request_uri).await?;
        check_response_error(&outcome, &[])?;

        parse_photo_info(&outcome.body)?.ok_or(ResolveError::NotFound)
    }
}

#[async_trait]
impl Resolver for PhotozouResolver {
    async fn get_images(&self, pattern_match: &PatternMatch) -> Result<Vec<ImageInfo>, ResolveError> {
        let id = pattern_match.group(1);
        let key = format!("{}{}", CACHE_PREFIX, id);

        let info: ImageInfo = self
            .cache
            .get_or_compute(&key, Self::get_photo_info(self.fetcher.clone(), Self::photo_info_uri(id)))
            .await?;
        Ok(vec![info])
    }
}

/// 解析 `rsp/info/photo`
///
/// 没有 `info` 元素（如 `stat="fail"`）时返回 `None`；
/// 缺少 `original_image_url` 时原图使用 `image_url`
fn parse_photo_info(xml: &str) -> Result<Option<ImageInfo>, ResolveError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut has_info = false;
    let mut image = None;
    let mut thumbnail = None;
    let mut original = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if path.len() == 1 && name == "info" {
                    has_info = true;
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if path.len() == 1 && e.name().as_ref() == b"info" {
                    has_info = true;
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                if path.len() == 4 && path[1] == "info" && path[2] == "photo" {
                    let text = t.unescape()?.into_owned();
                    match path[3].as_str() {
                        "image_url" => image = Some(text),
                        "thumbnail_image_url" => thumbnail = Some(text),
                        "original_image_url" => original = Some(text),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !has_info {
        return Ok(None);
    }

    let image = image.unwrap_or_default();
    let original = original.unwrap_or_else(|| image.clone());
    Ok(Some(ImageInfo::new(original, image, thumbnail.unwrap_or_default())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::html_fetcher::stub::StubFetcher;
    use crate::services::FetchOutcome;

    const PHOTO_INFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rsp stat="ok">
  <info>
    <photo>
      <photo_id>12345</photo_id>
      <image_url>http://photozou.jp/p/img/12345</image_url>
      <original_image_url>http://photozou.jp/bin/photo/12345/org.bin?size=1024</original_image_url>
      <thumbnail_image_url>http://photozou.jp/p/thumb/12345</thumbnail_image_url>
    </photo>
  </info>
</rsp>"#;

    #[test]
    fn test_regex() {
        let m = PhotozouProvider
            .try_match("http://photozou.jp/photo/show/123/45678")
            .unwrap();
        assert_eq!(m.group(1), "45678");

        let m = PhotozouProvider
            .try_match("HTTPS://WWW.PHOTOZOU.JP/photo/photo_only/123/45678/?lang=ja")
            .unwrap();
        assert_eq!(m.group(1), "45678");

        assert!(PhotozouProvider
            .try_match("http://photozou.jp/photo/list/123/45678")
            .is_none());
    }

    #[test]
    fn test_parse_photo_info() {
        let info = parse_photo_info(PHOTO_INFO).unwrap().unwrap();
        assert_eq!(info.full(), "http://photozou.jp/bin/photo/12345/org.bin?size=1024");
        assert_eq!(info.display(), "http://photozou.jp/p/img/12345");
        assert_eq!(info.thumbnail(), "http://photozou.jp/p/thumb/12345");
    }

    #[test]
    fn test_parse_photo_info_without_original() {
        let xml = r#"<rsp stat="ok"><info><photo>
            <image_url>http://photozou.jp/p/img/1</image_url>
            <thumbnail_image_url>http://photozou.jp/p/thumb/1</thumbnail_image_url>
        </photo></info></rsp>"#;
        let info = parse_photo_info(xml).unwrap().unwrap();
        assert_eq!(info.full(), "http://photozou.jp/p/img/1");
        assert_eq!(info.display(), "http://photozou.jp/p/img/1");
    }

    #[test]
    fn test_parse_photo_info_fail_response() {
        let xml = r#"<rsp stat="fail"><err code="ERROR_PHOTO_NOT_FOUND" msg="photo not found" /></rsp>"#;
        assert!(parse_photo_info(xml).unwrap().is_none());
    }

    #[test]
    fn test_parse_photo_info_malformed() {
        let result = parse_photo_info("<rsp><info><photo></info></rsp>");
        assert!(matches!(result, Err(ResolveError::Parse(_))));
    }

    #[tokio::test]
    async fn test_get_images() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            "http://api.photozou.jp/rest/photo_info?photo_id=12345",
            Ok(FetchOutcome::new(200, PHOTO_INFO)),
        );
        let context = ResolverContext::new(ResolverCache::default(), fetcher.clone());
        let resolver = PhotozouProvider.resolver(&context);

        let m = PhotozouProvider
            .try_match("http://photozou.jp/photo/show/1/12345")
            .unwrap();
        let first = resolver.get_images(&m).await.unwrap();
        let second = resolver.get_images(&m).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].thumbnail(), "http://photozou.jp/p/thumb/12345");
        assert_eq!(fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_images_not_found() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            "http://api.photozou.jp/rest/photo_info?photo_id=9",
            Ok(FetchOutcome::new(200, r#"<rsp stat="fail"><err code="x"/></rsp>"#)),
        );
        let context = ResolverContext::new(ResolverCache::default(), fetcher);
        let resolver = PhotozouResolver::new(&context);

        let m = PatternMatch::new(vec!["http://photozou.jp/photo/show/1/9".into(), "9".into()]);
        let result = resolver.get_images(&m).await;
        assert!(matches!(result, Err(ResolveError::NotFound)));
    }
}
