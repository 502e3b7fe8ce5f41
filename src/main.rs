use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use flipbook_fetch::utils::{display_elapsed_time, safe_file_name};
use flipbook_fetch::{BookRequest, FlipbookCrawler, PageFolder, PdfAssembler, Settings, logger};

/// 下载 AnyFlip 或 FlipHTML5 翻页书并转换为 PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// AnyFlip 或 FlipHTML5 书籍链接（也可以是内嵌了翻页书的页面）
    url: String,
    /// 临时下载目录，默认为书名
    #[arg(long, value_name = "DIR")]
    temp_download_folder: Option<PathBuf>,
    /// 生成的 PDF 文件名（不含扩展名），默认为书名
    #[arg(long)]
    title: Option<String>,
    /// 完成后保留临时下载目录
    #[arg(long)]
    keep_download_folder: bool,
    /// 配置文件，默认读取当前目录下的 flipbook.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init();

    let start = Instant::now();
    let settings = Settings::load(cli.config.as_deref())?;
    let compress = settings.compress_pdf;
    let crawler = FlipbookCrawler::new(settings)?;

    let request = BookRequest::parse(&cli.url)?;
    let Some(book) = crawler.prepare(request).await? else {
        return Ok(());
    };

    let folder_path = cli
        .temp_download_folder
        .unwrap_or_else(|| PathBuf::from(safe_file_name(&book.title)));
    let output = PathBuf::from(format!(
        "{}.pdf",
        safe_file_name(cli.title.as_deref().unwrap_or(&book.title))
    ));

    let folder = PageFolder::create(folder_path).await?;
    let pages = crawler.download_pages(&book, &folder).await?;

    info!("正在转换为 PDF");
    let assembled = PdfAssembler::new(compress)
        .assemble_pages(pages, output.clone())
        .await;
    folder
        .finish(&assembled, &output, cli.keep_download_folder)
        .await;

    display_elapsed_time(start.elapsed());
    Ok(())
}
