pub mod downloader;
pub mod parser;
pub mod processor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, info, instrument, warn};

pub use downloader::Fetcher;
pub use parser::{ConfigPayload, Parser};
pub use processor::PageFolder;

use crate::book::{self, Book, BookRequest, PageNames, ResolvedBook};
use crate::config::Settings;
use crate::platform::Platform;

/// 配置中的页数超过该值时视为无效
const MAX_PAGE_COUNT: usize = 10_000;

pub struct FlipbookCrawler {
    parser: Parser,
    fetcher: Fetcher,
    settings: Settings,
}

impl FlipbookCrawler {
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self {
            parser: Parser,
            fetcher: Fetcher::new(&settings)?,
            settings,
        })
    }

    /// 确定书籍所在的平台。
    ///
    /// 已经是平台链接时原样返回，不发起请求；否则抓取页面并采用最后一个指向平台的 iframe。
    /// 找不到平台时返回 `None`。
    #[instrument(skip_all)]
    pub async fn resolve(&self, request: BookRequest) -> Result<Option<ResolvedBook>> {
        let mut working_url = request.source_url.clone();

        if Platform::detect(&working_url).is_none() {
            info!("正在查找页面中的翻页书: {}", working_url);
            let response = self.fetcher.get(&working_url, &request.source_url).await?;
            if !response.status().is_success() {
                error!("未找到书籍: 页面请求返回 {}", response.status());
                return Ok(None);
            }
            let page_html = response
                .text()
                .await
                .with_context(|| format!("读取页面失败 {}", working_url))?;
            match self.parser.frame_url(&page_html, &working_url) {
                Some(frame_url) => {
                    info!("找到内嵌翻页书: {}", frame_url);
                    working_url = frame_url;
                }
                None => warn!("页面中没有指向受支持平台的 iframe"),
            }
        }

        let Some(platform) = Platform::detect(&working_url) else {
            error!("不支持的链接: {}", working_url);
            return Ok(None);
        };
        let base_url = platform.base_url(&working_url, &self.settings)?;
        debug!("平台: {}, 书籍根目录: {}", platform, base_url);

        Ok(Some(ResolvedBook {
            source_url: request.source_url,
            resolved_url: working_url,
            platform,
            base_url,
        }))
    }

    /// 解析配置并生成页面地址，找不到书籍时返回 `None`
    #[instrument(skip_all)]
    pub async fn prepare(&self, request: BookRequest) -> Result<Option<Book>> {
        let Some(resolved) = self.resolve(request).await? else {
            error!("未找到书籍");
            return Ok(None);
        };

        let config_url = resolved.config_url()?;
        info!("正在读取配置: {}", config_url);
        let response = self.fetcher.get(&config_url, &resolved.resolved_url).await?;
        if !response.status().is_success() {
            error!("未找到书籍: 配置请求返回 {}", response.status());
            return Ok(None);
        }
        let config = self.parser.config(response.text().await?);

        self.build_book(resolved, &config)
    }

    fn build_book(&self, resolved: ResolvedBook, config: &ConfigPayload) -> Result<Option<Book>> {
        let Some(title) = config.title() else {
            error!("未找到书籍: 配置中没有书名");
            return Ok(None);
        };
        let page_count = config.page_count();
        let names = config.page_names();

        match &names {
            PageNames::Listed(names) => debug!("配置列出了 {} 个页面文件", names.len()),
            PageNames::Empty => debug!("配置中没有页面文件名，按页码生成"),
            PageNames::Invalid(reason) => debug!("页面文件名解析失败，按页码生成: {}", reason),
        }

        if page_count == 0 && !matches!(names, PageNames::Listed(_)) {
            error!("未找到书籍: 配置中没有页数");
            return Ok(None);
        }
        if page_count > MAX_PAGE_COUNT && !matches!(names, PageNames::Listed(_)) {
            error!("未找到书籍: 配置中的页数异常 ({})", page_count);
            return Ok(None);
        }

        info!("找到书籍: {}, 共 {} 页", title, page_count);
        let page_urls = book::page_urls(&resolved.base_url, &names, page_count)?;

        Ok(Some(Book {
            source_url: resolved.source_url,
            resolved_url: resolved.resolved_url,
            title,
            page_count,
            page_urls,
        }))
    }

    /// 按顺序逐页下载，任一页面失败即中止
    #[instrument(skip_all)]
    pub async fn download_pages(&self, book: &Book, folder: &PageFolder) -> Result<Vec<PathBuf>> {
        let total = book.page_urls.len();
        let referer = &book.resolved_url;
        info!("正在下载 {} 页到 {}", total, folder.path().display());

        stream::iter(book.page_urls.iter().enumerate())
            .then(|(index, url)| async move {
                let page_bytes = self.fetcher.bytes(url, referer).await?;
                Ok::<_, anyhow::Error>((index, url, page_bytes))
            })
            .and_then(|(index, url, page_bytes)| async move {
                let page_path = folder.write_page(index, url, page_bytes).await?;
                info!("[{}/{}] {}", index + 1, total, url);
                Ok(page_path)
            })
            .try_collect()
            .await
    }
}
