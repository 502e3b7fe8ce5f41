use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// 本次运行独占的页面下载目录
#[derive(Debug)]
pub struct PageFolder {
    path: PathBuf,
}

impl PageFolder {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)
            .await
            .with_context(|| format!("无法创建下载目录: {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 第 `index` 页（从 0 开始）的文件名：四位序号加上原始扩展名
    pub fn page_file_name(index: usize, url: &Url) -> String {
        let extension = Path::new(url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        format!("{:04}{}", index, extension)
    }

    #[instrument(skip_all)]
    pub async fn write_page(&self, index: usize, url: &Url, page_bytes: Bytes) -> Result<PathBuf> {
        let page_path = self.path.join(Self::page_file_name(index, url));
        fs::write(&page_path, &page_bytes)
            .await
            .with_context(|| format!("保存图片失败 {}", page_path.display()))?;
        debug!("图片已保存到: {}", page_path.display());
        Ok(page_path)
    }

    pub async fn remove(self) {
        info!("正在清理临时文件夹: {}", self.path.display());
        match fs::remove_dir_all(&self.path).await {
            Ok(_) => info!("临时文件夹已删除: {}", self.path.display()),
            Err(e) => error!("删除临时文件夹时出错: {}: {}", self.path.display(), e),
        }
    }

    /// 根据 PDF 生成结果收尾：成功且未要求保留时删除目录，失败时保留目录。
    /// 返回目录是否仍然保留。
    pub async fn finish(self, assembled: &Result<usize>, output: &Path, keep: bool) -> bool {
        match assembled {
            Ok(pages) => {
                info!("任务完成，共 {} 页，文件已保存为 {}", pages, output.display());
                if keep {
                    info!("已保留下载目录: {}", self.path.display());
                    true
                } else {
                    self.remove().await;
                    false
                }
            }
            Err(e) => {
                error!("生成 PDF 失败: {:#}", e);
                warn!("下载目录已保留: {}", self.path.display());
                true
            }
        }
    }
}
