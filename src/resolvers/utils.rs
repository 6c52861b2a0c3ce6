// 解析器公共工具
//
// - 请求前的日志
// - 带日志的页面获取
// - 响应错误分类
// - 常用 HTML 提取（og:image、按选择器读取属性）

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::info;

use super::error::{FetchError, ResolveError};
use crate::services::{FetchOutcome, HtmlFetcher};

/// 编译插件正则，只在第一次调用时编译
pub fn compile_pattern(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("插件正则表达式编译失败"))
}

/// 每次请求远端前记录一条日志
pub fn requesting_message(request_uri: &str) {
    info!(request_uri = %request_uri, "Requesting {}", request_uri);
}

/// 记录日志后获取页面
///
/// 传输层错误转换为 `ResolveError::Fetch`，状态码留给调用方分类
pub async fn fetch(fetcher: &dyn HtmlFetcher, request_uri: &str) -> Result<FetchOutcome, ResolveError> {
    requesting_message(request_uri);
    let outcome = fetcher.get(request_uri).await?;
    Ok(outcome)
}

/// 响应错误分类
///
/// - 404 或正文包含任一“无数据”标记：`NotFound`
/// - 其他非 2xx：临时失败
pub fn check_response_error(outcome: &FetchOutcome, not_found_markers: &[&str]) -> Result<(), ResolveError> {
    if outcome.status == 404
        || not_found_markers
            .iter()
            .any(|marker| outcome.body.contains(marker))
    {
        return Err(ResolveError::NotFound);
    }

    if !outcome.is_success() {
        return Err(ResolveError::Fetch(FetchError::HttpStatus(outcome.status)));
    }

    Ok(())
}

fn og_image_selector() -> &'static Selector {
    static OG_IMAGE: OnceLock<Selector> = OnceLock::new();
    OG_IMAGE.get_or_init(|| {
        Selector::parse(r#"meta[property="og:image"]"#).expect("og:image 选择器解析失败")
    })
}

/// 读取页面的 og:image，没有时返回空字符串
pub fn og_image(document: &Html) -> String {
    document
        .select(og_image_selector())
        .next()
        .and_then(|element| element.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

/// 按文档顺序读取所有匹配元素的属性，缺少属性的元素记为空字符串
pub fn select_attributes(document: &Html, selector: &Selector, attribute: &str) -> Vec<String> {
    document
        .select(selector)
        .map(|element| element.value().attr(attribute).unwrap_or_default().to_string())
        .collect()
}
