use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, ImageFormat};
use lopdf::{Stream, dictionary};

/// 解码后的页面图片，已转换为 PDF 图像对象
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    stream: Stream,
}

impl PageImage {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("读取图片失败: {}", path.display()))?;
        let format = image::guess_format(&data)
            .with_context(|| format!("无法识别图片格式: {}", path.display()))?;
        let decoded = image::load_from_memory_with_format(&data, format)
            .with_context(|| format!("图片解码失败: {}", path.display()))?;

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("图片尺寸为空: {}", path.display());
        }

        // 8 位灰度或三通道 JPEG 直接嵌入原始数据，其他情况（含 CMYK/YCCK）转为 RGB 像素
        let passthrough = match format {
            ImageFormat::Jpeg => jpeg_color_space(&data),
            _ => None,
        };
        let stream = match passthrough {
            Some(color_space) => jpeg_stream(width, height, color_space, data),
            None => rgb_stream(&decoded),
        };

        Ok(Self {
            width,
            height,
            stream,
        })
    }

    pub fn into_stream(self) -> Stream {
        self.stream
    }
}

/// 可以原样嵌入时返回对应的 PDF 色彩空间
fn jpeg_color_space(data: &[u8]) -> Option<&'static str> {
    match jpeg_frame(data)? {
        (8, 1) => Some("DeviceGray"),
        (8, 3) => Some("DeviceRGB"),
        _ => None,
    }
}

/// 读取 JPEG 帧头（SOFn）中的采样精度和分量数
fn jpeg_frame(data: &[u8]) -> Option<(u8, u8)> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    loop {
        if *data.get(pos)? != 0xFF {
            return None;
        }
        while *data.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *data.get(pos)?;
        pos += 1;

        match marker {
            // 无长度字段的标记
            0x01 | 0xD0..=0xD7 => continue,
            // 扫描数据开始前仍未找到帧头
            0xD9 | 0xDA => return None,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let precision = *data.get(pos + 2)?;
                let components = *data.get(pos + 7)?;
                return Some((precision, components));
            }
            _ => {
                let length = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
                if length < 2 {
                    return None;
                }
                pos += length;
            }
        }
    }
}

fn jpeg_stream(width: u32, height: u32, color_space: &str, data: Vec<u8>) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8i64,
        "Filter" => "DCTDecode",
    };
    Stream::new(dict, data)
}

fn rgb_stream(decoded: &DynamicImage) -> Stream {
    let rgb = decoded.to_rgb8();
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(rgb.width()),
        "Height" => i64::from(rgb.height()),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8i64,
    };
    Stream::new(dict, rgb.into_raw())
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};

    use super::*;

    #[test]
    fn reads_component_count_from_frame_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rgb = dir.path().join("rgb.jpg");
        let gray = dir.path().join("gray.jpg");
        RgbImage::from_pixel(6, 4, Rgb([1, 2, 3])).save(&rgb).unwrap();
        GrayImage::from_pixel(6, 4, Luma([7])).save(&gray).unwrap();

        assert_eq!(jpeg_frame(&std::fs::read(&rgb).unwrap()), Some((8, 3)));
        assert_eq!(jpeg_frame(&std::fs::read(&gray).unwrap()), Some((8, 1)));

        // SOI、空的 APP0、四分量的 SOF2
        let cmyk_header = [
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xC2, 0x00, 0x14, 0x08, 0x00,
            0x10, 0x00, 0x10, 0x04,
        ];
        assert_eq!(jpeg_frame(&cmyk_header), Some((8, 4)));
        assert_eq!(jpeg_color_space(&cmyk_header), None);

        assert_eq!(jpeg_frame(b"\x89PNG\r\n"), None);
        assert_eq!(jpeg_frame(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]), None);
    }

    #[test]
    fn rgb_jpeg_is_embedded_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.jpg");
        RgbImage::from_pixel(12, 8, Rgb([30, 60, 90])).save(&path).unwrap();

        let stream = PageImage::open(&path).unwrap().into_stream();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.content, std::fs::read(&path).unwrap());
    }

    #[test]
    fn cmyk_jpeg_is_converted_to_rgb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cmyk.jpg");
        let pixels = vec![40u8; 16 * 16 * 4];
        jpeg_encoder::Encoder::new_file(&path, 90)
            .unwrap()
            .encode(&pixels, 16, 16, jpeg_encoder::ColorType::Cmyk)
            .unwrap();
        assert_eq!(jpeg_frame(&std::fs::read(&path).unwrap()), Some((8, 4)));

        let image = PageImage::open(&path).unwrap();
        assert_eq!((image.width, image.height), (16, 16));
        let stream = image.into_stream();
        assert!(stream.dict.get(b"Filter").is_err());
        assert_eq!(
            stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceRGB"
        );
        assert_eq!(stream.content.len(), 16 * 16 * 3);
    }
}
