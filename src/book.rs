use anyhow::{Context, Result};
use url::Url;

use crate::platform::Platform;

// 页面大图相对书籍根目录的位置
static PAGE_DIR: &str = "files/large/";

/// 页面文件名的提取结果
#[derive(Debug, Clone, PartialEq)]
pub enum PageNames {
    /// 配置中按顺序列出的文件名
    Listed(Vec<String>),
    /// 配置中没有文件名列表
    Empty,
    /// 文件名列表存在但无法解析
    Invalid(String),
}

/// 用户输入的书籍链接
#[derive(Debug, Clone)]
pub struct BookRequest {
    pub source_url: Url,
}

impl BookRequest {
    pub fn parse(input: &str) -> Result<Self> {
        let source_url =
            Url::parse(input.trim()).with_context(|| format!("链接格式无效: {}", input))?;
        Ok(Self { source_url })
    }
}

/// 确定平台之后的书籍
#[derive(Debug, Clone)]
pub struct ResolvedBook {
    pub source_url: Url,
    /// 当前工作链接，也作为后续请求的 Referer
    pub resolved_url: Url,
    pub platform: Platform,
    pub base_url: Url,
}

impl ResolvedBook {
    pub fn config_url(&self) -> Result<Url> {
        self.platform.config_url(&self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct Book {
    pub source_url: Url,
    pub resolved_url: Url,
    pub title: String,
    pub page_count: usize,
    pub page_urls: Vec<Url>,
}

/// 生成按阅读顺序排列的页面图片地址。
///
/// 列出了文件名时只使用文件名，忽略页数；否则按 `1.jpg` 到 `{page_count}.jpg` 编号。
pub fn page_urls(base_url: &Url, names: &PageNames, page_count: usize) -> Result<Vec<Url>> {
    let page_dir = base_url
        .join(PAGE_DIR)
        .with_context(|| format!("无法拼接页面目录: {}", base_url))?;

    match names {
        PageNames::Listed(names) => names
            .iter()
            .map(|name| {
                page_dir
                    .join(name)
                    .with_context(|| format!("无法拼接页面地址: {}", name))
            })
            .collect(),
        PageNames::Empty | PageNames::Invalid(_) => (1..=page_count)
            .map(|index| {
                page_dir
                    .join(&format!("{}.jpg", index))
                    .with_context(|| format!("无法拼接第 {} 页地址", index))
            })
            .collect(),
    }
}
