//! # 捕获内容模型
//!
//! `CapturedContent` 是一次捕获的归一化结果，只能是文本或图片之一，
//! 构造后种类不再改变。
//!
//! - 文本在构造时去除首尾空白，空串无法构造（提取失败而不是产生空条目）。
//! - 图片保存捕获时的原始编码字节，之后不再重新编码；回放与指纹都基于这份字节。

use std::fmt;

use base64::Engine;
use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::error::HistoryError;

/// 内容种类，参与去重判等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// 图片载荷的编码格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Tiff,
    Bmp,
    Jpeg,
    Gif,
    Other,
    /// 未能编码的原始 RGBA 像素，没有可导出的规范字节形式
    RawRgba,
}

impl From<image::ImageFormat> for ImageFormat {
    fn from(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Png => Self::Png,
            image::ImageFormat::Tiff => Self::Tiff,
            image::ImageFormat::Bmp => Self::Bmp,
            image::ImageFormat::Jpeg => Self::Jpeg,
            image::ImageFormat::Gif => Self::Gif,
            _ => Self::Other,
        }
    }
}

/// 捕获到的图片。
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    format: ImageFormat,
    width: u32,
    height: u32,
    bytes: Bytes,
}

impl CapturedImage {
    /// 从已编码的图片字节构造（PNG / TIFF / BMP ...）。
    ///
    /// 解码仅用于校验与读取尺寸，保存的仍是传入的原始字节。
    pub fn encoded(bytes: impl Into<Bytes>) -> Result<Self, HistoryError> {
        let bytes = bytes.into();
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            format: format.into(),
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }

    /// 由调用方刚编码好的字节构造，跳过重复解码。
    pub(crate) fn from_encoded_parts(format: ImageFormat, width: u32, height: u32, bytes: Bytes) -> Self {
        Self {
            format,
            width,
            height,
            bytes,
        }
    }

    /// 从原始 RGBA 像素构造，不做编码。
    ///
    /// 像素长度必须等于 `width * height * 4`。
    pub fn raw_rgba(width: u32, height: u32, rgba: impl Into<Bytes>) -> Result<Self, HistoryError> {
        let rgba = rgba.into();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| HistoryError::Image(format!("图片尺寸溢出: {}x{}", width, height)))?;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(HistoryError::Image(format!(
                "RGBA 数据长度不匹配: {}x{} 需要 {} 字节，实际 {} 字节",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        Ok(Self {
            format: ImageFormat::RawRgba,
            width,
            height,
            bytes: rgba,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 载荷字节（编码图片或原始 RGBA）。
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// 规范的可导出字节形式；原始像素没有。
    pub fn exportable_bytes(&self) -> Option<&[u8]> {
        match self.format {
            ImageFormat::RawRgba => None,
            _ => Some(&self.bytes),
        }
    }

    /// 嗅探得到的 MIME 类型。
    pub fn mime_type(&self) -> Option<&'static str> {
        self.exportable_bytes()
            .and_then(infer::get)
            .map(|kind| kind.mime_type())
    }

    /// 解码为 RGBA 像素，供回放写入与取色使用。
    pub(crate) fn to_rgba(&self) -> Result<image::RgbaImage, HistoryError> {
        match self.format {
            ImageFormat::RawRgba => {
                image::RgbaImage::from_raw(self.width, self.height, self.bytes.to_vec())
                    .ok_or_else(|| HistoryError::Image("创建图像缓冲区失败".to_string()))
            }
            _ => Ok(image::load_from_memory(&self.bytes)?.to_rgba8()),
        }
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Serialize)]
struct ImageView<'a> {
    format: ImageFormat,
    width: u32,
    height: u32,
    mime: Option<&'static str>,
    data: &'a str,
}

impl Serialize for CapturedImage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        ImageView {
            format: self.format,
            width: self.width,
            height: self.height,
            mime: self.mime_type(),
            data: &data,
        }
        .serialize(serializer)
    }
}

/// 一次捕获的归一化内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CapturedContent {
    Text { normalized: String },
    Image { image: CapturedImage },
}

impl CapturedContent {
    /// 去除首尾空白后构造文本内容；空白串返回 `None`。
    pub fn text(raw: &str) -> Option<Self> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return None;
        }
        Some(Self::Text {
            normalized: normalized.to_string(),
        })
    }

    pub fn image(image: CapturedImage) -> Self {
        Self::Image { image }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text { .. } => ContentKind::Text,
            Self::Image { .. } => ContentKind::Image,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { normalized } => Some(normalized),
            Self::Image { .. } => None,
        }
    }

    pub fn as_image(&self) -> Option<&CapturedImage> {
        match self {
            Self::Text { .. } => None,
            Self::Image { image } => Some(image),
        }
    }
}
