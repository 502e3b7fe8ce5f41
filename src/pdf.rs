pub mod page;

pub use page::PageImage;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::{debug, info, instrument};

static IMAGE_NAME: &str = "Im0";

/// 把页面图片按顺序合成为 PDF，每页尺寸与图片像素尺寸一致
#[derive(Debug, Clone, Copy)]
pub struct PdfAssembler {
    compress: bool,
}

impl PdfAssembler {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// 在阻塞线程池中合成，图片按文件名排序
    pub async fn assemble_pages(self, mut images: Vec<PathBuf>, dest: PathBuf) -> Result<usize> {
        images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        tokio::task::spawn_blocking(move || self.assemble(&images, &dest)).await?
    }

    /// 全部页面成功后才写入 `dest`，返回页数
    #[instrument(skip_all)]
    pub fn assemble(&self, images: &[PathBuf], dest: &Path) -> Result<usize> {
        if images.is_empty() {
            anyhow::bail!("没有可用于生成 PDF 的图片");
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(images.len());

        for (index, path) in images.iter().enumerate() {
            let image = PageImage::open(path)?;
            let (width, height) = (image.width, image.height);
            let image_id = doc.add_object(image.into_stream());

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            int(width),
                            int(0),
                            int(0),
                            int(height),
                            int(0),
                            int(0),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content
                    .encode()
                    .with_context(|| format!("第 {} 页内容编码失败", index + 1))?,
            ));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![int(0), int(0), int(width), int(height)],
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        IMAGE_NAME => image_id,
                    },
                },
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
            debug!("[{}/{}] {} ({}x{})", index + 1, images.len(), path.display(), width, height);
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if self.compress {
            doc.compress();
        }

        if let Err(e) = doc.save(dest) {
            // 不保留写了一半的文件
            let _ = std::fs::remove_file(dest);
            return Err(e).with_context(|| format!("PDF 保存失败: {}", dest.display()));
        }

        info!("PDF 已生成: {}, 共 {} 页", dest.display(), page_count);
        Ok(page_count)
    }
}

fn int(value: u32) -> Object {
    Object::Integer(i64::from(value))
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn media_boxes(path: &Path) -> Vec<(i64, i64)> {
        let doc = Document::load(path).expect("load pdf");
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                (
                    media_box[2].as_i64().unwrap(),
                    media_box[3].as_i64().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn pages_match_image_sizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("0000.jpg");
        let second = dir.path().join("0001.png");
        let third = dir.path().join("0002.jpg");
        let fourth = dir.path().join("0003.png");
        RgbImage::from_pixel(40, 60, Rgb([200, 10, 10])).save(&first).unwrap();
        RgbaImage::from_pixel(25, 15, Rgba([0, 0, 255, 128])).save(&second).unwrap();
        GrayImage::from_pixel(8, 9, Luma([90])).save(&third).unwrap();
        GrayImage::from_pixel(3, 4, Luma([10])).save(&fourth).unwrap();

        let dest = dir.path().join("book.pdf");
        let images = vec![first, second, third, fourth];
        let pages = PdfAssembler::new(true).assemble(&images, &dest).unwrap();

        assert_eq!(pages, 4);
        assert_eq!(media_boxes(&dest), vec![(40, 60), (25, 15), (8, 9), (3, 4)]);
    }

    #[tokio::test]
    async fn pages_follow_file_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let late = dir.path().join("0001.png");
        let early = dir.path().join("0000.png");
        RgbImage::new(30, 10).save(&late).unwrap();
        RgbImage::new(10, 30).save(&early).unwrap();

        let dest = dir.path().join("ordered.pdf");
        let pages = PdfAssembler::new(false)
            .assemble_pages(vec![late, early], dest.clone())
            .await
            .unwrap();

        assert_eq!(pages, 2);
        assert_eq!(media_boxes(&dest), vec![(10, 30), (30, 10)]);
    }

    #[test]
    fn unreadable_image_aborts_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("0000.png");
        let bad = dir.path().join("0001.jpg");
        RgbImage::new(5, 5).save(&good).unwrap();
        std::fs::write(&bad, b"<html>404 not found</html>").unwrap();

        let dest = dir.path().join("broken.pdf");
        let result = PdfAssembler::new(true).assemble(&[good, bad], &dest);

        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("empty.pdf");
        assert!(PdfAssembler::new(true).assemble(&[], &dest).is_err());
        assert!(!dest.exists());
    }
}
