//! 图片表示的提取策略（编码位图与通用图片对象）

use std::io::Cursor;

use bytes::Bytes;

use crate::clipboard::{ClipboardFormat, ClipboardSnapshot};
use crate::content::{CapturedContent, CapturedImage, ImageFormat};

/// 已编码的图片表示（主位图格式、PNG）。解码成功才算命中。
pub(super) fn encoded(snapshot: &ClipboardSnapshot, format: ClipboardFormat) -> Option<CapturedContent> {
    let data = snapshot.data(format)?;
    if data.is_empty() {
        return None;
    }
    match CapturedImage::encoded(data.clone()) {
        Ok(image) => Some(CapturedContent::image(image)),
        Err(err) => {
            log::debug!("{:?} 表示无法解码，尝试下一种: {}", format, err);
            None
        }
    }
}

/// 平台暴露的通用图片对象。
///
/// 捕获时编码一次为 PNG；编码失败则保留原始像素（指纹会退化）。
pub(super) fn image_object(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    let raw = snapshot.image_object()?;
    if raw.width == 0 || raw.height == 0 {
        return None;
    }
    let Some(buffer) = image::RgbaImage::from_raw(raw.width, raw.height, raw.rgba.to_vec()) else {
        log::debug!(
            "图片对象像素长度不匹配 ({}x{}, {} 字节)，跳过",
            raw.width,
            raw.height,
            raw.rgba.len()
        );
        return None;
    };

    let mut encoded = Vec::new();
    match buffer.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png) {
        Ok(()) => Some(CapturedContent::image(CapturedImage::from_encoded_parts(
            ImageFormat::Png,
            raw.width,
            raw.height,
            Bytes::from(encoded),
        ))),
        Err(err) => {
            log::warn!("⚠️ 图片对象编码 PNG 失败，保留原始像素: {}", err);
            CapturedImage::raw_rgba(raw.width, raw.height, raw.rgba.clone())
                .ok()
                .map(CapturedContent::image)
        }
    }
}
