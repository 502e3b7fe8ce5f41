use std::fmt;

use anyhow::{Context, Result};
use url::Url;

use crate::config::Settings;

const ANYFLIP_DOMAIN: &str = "anyflip.com";
const FLIPHTML5_DOMAIN: &str = "fliphtml5.com";

// 阅读器入口页的路径后缀，按从长到短的顺序匹配
const VIEWER_SUFFIXES: [&str; 3] = ["/mobile/index.html", "/index.html", "/mobile/"];

/// 支持的翻页书托管平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    AnyFlip,
    FlipHtml5,
}

impl Platform {
    /// 根据域名判断链接所属的平台，子域名（如 `online.anyflip.com`）同样匹配
    pub fn detect(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        if matches_domain(&host, ANYFLIP_DOMAIN) {
            Some(Platform::AnyFlip)
        } else if matches_domain(&host, FLIPHTML5_DOMAIN) {
            Some(Platform::FlipHtml5)
        } else {
            None
        }
    }

    fn host<'a>(&self, settings: &'a Settings) -> &'a str {
        match self {
            Platform::AnyFlip => &settings.anyflip_host,
            Platform::FlipHtml5 => &settings.fliphtml5_host,
        }
    }

    fn config_path(&self) -> &'static str {
        match self {
            Platform::AnyFlip => "mobile/javascript/config.js",
            Platform::FlipHtml5 => "javascript/config.js",
        }
    }

    /// 书籍在在线阅读器上的根目录，总是以 `/` 结尾
    pub fn base_url(&self, url: &Url, settings: &Settings) -> Result<Url> {
        let mut host = self.host(settings).to_owned();
        if !host.ends_with('/') {
            host.push('/');
        }
        let host = Url::parse(&host).with_context(|| format!("平台地址无效: {}", host))?;

        let mut path = url.path();
        for suffix in VIEWER_SUFFIXES {
            if let Some(stripped) = path.strip_suffix(suffix) {
                path = stripped;
                break;
            }
        }
        let mut path = path.trim_start_matches('/').to_owned();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }

        host.join(&path)
            .with_context(|| format!("无法拼接书籍地址: {}{}", host, path))
    }

    /// 平台配置脚本（config.js）的地址
    pub fn config_url(&self, base_url: &Url) -> Result<Url> {
        base_url
            .join(self.config_path())
            .with_context(|| format!("无法拼接配置地址: {}", base_url))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::AnyFlip => write!(f, "AnyFlip"),
            Platform::FlipHtml5 => write!(f, "FlipHTML5"),
        }
    }
}

fn matches_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
