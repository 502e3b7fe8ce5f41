use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::book::PageNames;
use crate::platform::Platform;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"([^"]*)""#).expect("书名正则表达式编译失败"));

static PAGE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""pageCount"\s*:\s*(\d+)"#).expect("页数正则表达式编译失败"));

// `var htmlConfig = {...};` 中的赋值部分
static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^var\s+[\w$]+\s*=\s*").expect("赋值正则表达式编译失败"));

static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe[src]").expect("无法创建iframe选择器"));

#[derive(Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// 在包装页面中查找指向受支持平台的 iframe，有多个时取最后一个
    #[instrument(skip_all)]
    pub fn frame_url(&self, page_html: &str, page_url: &Url) -> Option<Url> {
        let document = Html::parse_document(page_html);
        let mut found = None;

        for frame in document.select(&IFRAME_SELECTOR) {
            let Some(src) = frame.value().attr("src") else {
                continue;
            };
            let src = src.trim();
            if src.is_empty() {
                continue;
            }
            let Ok(frame_url) = page_url.join(src) else {
                debug!("忽略无效的 iframe 地址: {}", src);
                continue;
            };
            if Platform::detect(&frame_url).is_some() {
                found = Some(frame_url);
            }
        }
        found
    }

    pub fn config(&self, config_js: String) -> ConfigPayload {
        ConfigPayload { raw: config_js }
    }
}

/// 平台 config.js 的原始文本
#[derive(Debug, Clone)]
pub struct ConfigPayload {
    raw: String,
}

#[derive(Deserialize)]
struct HtmlConfig {
    #[serde(default)]
    fliphtml5_pages: Vec<PageRecord>,
}

#[derive(Deserialize)]
struct PageRecord {
    #[serde(default)]
    n: Vec<String>,
}

impl ConfigPayload {
    pub fn title(&self) -> Option<String> {
        let raw = TITLE_RE.captures(&self.raw)?.get(1)?.as_str();
        // 书名可能带有 JSON 转义（如 \u00e9）
        let title = serde_json::from_str::<String>(&format!("\"{}\"", raw))
            .unwrap_or_else(|_| raw.to_owned());
        Some(title)
    }

    pub fn page_count(&self) -> usize {
        PAGE_COUNT_RE
            .captures(&self.raw)
            .and_then(|caps| caps.get(1))
            .and_then(|count| count.as_str().parse().ok())
            .unwrap_or(0)
    }

    /// 从 `fliphtml5_pages` 中按顺序取出每页的文件名
    pub fn page_names(&self) -> PageNames {
        let body = ASSIGNMENT_RE.replace(self.raw.trim(), "");
        let body = body.trim();
        let body = body.strip_suffix(';').unwrap_or(body);

        let config: HtmlConfig = match serde_json::from_str(body) {
            Ok(config) => config,
            Err(e) => return PageNames::Invalid(format!("配置解析失败: {}", e)),
        };

        if config.fliphtml5_pages.is_empty() {
            return PageNames::Empty;
        }

        let mut names = Vec::with_capacity(config.fliphtml5_pages.len());
        for (index, page) in config.fliphtml5_pages.into_iter().enumerate() {
            let Some(name) = page.n.into_iter().next() else {
                return PageNames::Invalid(format!("第 {} 页缺少文件名", index + 1));
            };
            names.push(name);
        }
        PageNames::Listed(names)
    }
}
