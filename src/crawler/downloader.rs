use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::config::Settings;

/// 带固定浏览器请求头的 HTTP 客户端
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent).context("User-Agent 配置无效")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&settings.accept).context("Accept 配置无效")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self { client })
    }

    /// 发送 GET 请求，不检查状态码
    pub async fn get(&self, url: &Url, referer: &Url) -> Result<Response> {
        debug!("GET {} (Referer: {})", url, referer);
        self.client
            .get(url.clone())
            .header(REFERER, referer.as_str())
            .send()
            .await
            .with_context(|| format!("请求失败 {}", url))
    }

    pub async fn bytes(&self, url: &Url, referer: &Url) -> Result<Bytes> {
        let response = self
            .get(url, referer)
            .await?
            .error_for_status()
            .with_context(|| format!("下载失败 {}", url))?;
        response
            .bytes()
            .await
            .with_context(|| format!("读取响应失败 {}", url))
    }
}
