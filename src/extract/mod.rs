//! # 内容提取器
//!
//! ## 设计思路
//!
//! 给定一份不透明的剪贴板快照，按优先级尝试候选表示，产出零或一个
//! 归一化的 `CapturedContent`。纯函数，无副作用。
//!
//! 优先级（首个成功即返回，不混合）：
//!
//! ```text
//! 1. 图片   Bitmap（TIFF/BMP…） → PNG → 通用图片对象
//! 2. 纯文本 UTF-8 → UTF-16LE
//! 3. 富文本 RTF → HTML（去样式/标记后取文字）
//! ```
//!
//! 同时提供图片与文本时（复制渲染文本时很常见）选择图片，这是明确的策略。
//! 空串或纯空白解码结果视为失败，继续尝试下一种表示。
//!
//! ## 实现思路
//!
//! 每种表示是 `StrategyChain` 上的一个独立具名策略；链可以复用到其他
//! "多策略兜底读取"场景。

mod chain;
mod bitmap;
mod rich_text;
mod text;

use once_cell::sync::Lazy;

use crate::clipboard::{ClipboardFormat, ClipboardSnapshot};
use crate::content::CapturedContent;

pub use chain::StrategyChain;
pub use rich_text::{strip_html, strip_rtf};

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(Extractor::default);

/// 快照 → 内容的提取器。
pub struct Extractor {
    chain: StrategyChain<ClipboardSnapshot, CapturedContent>,
}

impl Default for Extractor {
    fn default() -> Self {
        let chain = StrategyChain::new()
            .then("bitmap", |s: &ClipboardSnapshot| bitmap::encoded(s, ClipboardFormat::Bitmap))
            .then("png", |s: &ClipboardSnapshot| bitmap::encoded(s, ClipboardFormat::Png))
            .then("image-object", bitmap::image_object)
            .then("plain-text", text::plain_utf8)
            .then("utf16-plain-text", text::plain_utf16)
            .then("rtf", text::rtf)
            .then("html", text::html);
        Self { chain }
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract(&self, snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
        match self.chain.run_named(snapshot) {
            Some((strategy, content)) => {
                log::trace!("🔎 提取命中策略: {}", strategy);
                Some(content)
            }
            None => {
                log::trace!("🔎 快照中没有可用表示");
                None
            }
        }
    }

    /// 策略名称，按尝试顺序。
    pub fn strategies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chain.names()
    }
}

/// 使用默认优先级提取。
pub fn extract(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    DEFAULT_EXTRACTOR.extract(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::RawImage;
    use crate::content::{ContentKind, ImageFormat};
    use bytes::Bytes;
    use std::io::Cursor;

    fn encoded(format: image::ImageFormat) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 10, 10, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), format).expect("encode");
        out
    }

    #[test]
    fn strategy_order_is_images_then_text_then_rich_text() {
        let names: Vec<_> = Extractor::new().strategies().collect();
        assert_eq!(
            names,
            vec!["bitmap", "png", "image-object", "plain-text", "utf16-plain-text", "rtf", "html"]
        );
    }

    #[test]
    fn image_wins_over_text() {
        let snapshot = ClipboardSnapshot::new()
            .with_text(ClipboardFormat::PlainText, "Hi")
            .with_data(ClipboardFormat::Png, encoded(image::ImageFormat::Png));
        let content = extract(&snapshot).expect("content");
        assert_eq!(content.kind(), ContentKind::Image);
    }

    #[test]
    fn bitmap_preferred_over_png_and_bytes_kept() {
        let tiff = encoded(image::ImageFormat::Tiff);
        let snapshot = ClipboardSnapshot::new()
            .with_data(ClipboardFormat::Png, encoded(image::ImageFormat::Png))
            .with_data(ClipboardFormat::Bitmap, tiff.clone());
        let image = extract(&snapshot).expect("content").as_image().cloned().expect("image");
        assert_eq!(image.format(), ImageFormat::Tiff);
        assert_eq!(image.bytes().as_ref(), tiff.as_slice());
    }

    #[test]
    fn undecodable_bitmap_falls_through_to_png() {
        let png = encoded(image::ImageFormat::Png);
        let snapshot = ClipboardSnapshot::new()
            .with_data(ClipboardFormat::Bitmap, vec![0_u8, 1, 2, 3])
            .with_data(ClipboardFormat::Png, png.clone());
        let image = extract(&snapshot).expect("content").as_image().cloned().expect("image");
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.bytes().as_ref(), png.as_slice());
    }

    #[test]
    fn image_object_is_encoded_once_as_png() {
        let snapshot = ClipboardSnapshot::new().with_image_object(RawImage {
            width: 2,
            height: 1,
            rgba: Bytes::from(vec![255_u8, 0, 0, 255, 0, 255, 0, 255]),
        });
        let image = extract(&snapshot).expect("content").as_image().cloned().expect("image");
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!((image.width(), image.height()), (2, 1));
    }

    #[test]
    fn malformed_image_object_falls_through_to_text() {
        let snapshot = ClipboardSnapshot::new()
            .with_image_object(RawImage {
                width: 4,
                height: 4,
                rgba: Bytes::from_static(&[0, 0, 0]),
            })
            .with_text(ClipboardFormat::PlainText, "fallback");
        assert_eq!(extract(&snapshot).and_then(|c| c.as_text().map(str::to_string)), Some("fallback".to_string()));
    }

    #[test]
    fn plain_text_preferred_over_rich_text() {
        let snapshot = ClipboardSnapshot::new()
            .with_text(ClipboardFormat::Html, "<b>Hi</b>")
            .with_text(ClipboardFormat::PlainText, "  Hi  ");
        let content = extract(&snapshot).expect("content");
        assert_eq!(content.as_text(), Some("Hi"));
    }

    #[test]
    fn whitespace_plain_text_falls_through_to_rich_text() {
        let snapshot = ClipboardSnapshot::new()
            .with_text(ClipboardFormat::PlainText, " \n ")
            .with_text(ClipboardFormat::Rtf, r"{\rtf1\ansi Rich}")
            .with_text(ClipboardFormat::Html, "<i>Html</i>");
        assert_eq!(extract(&snapshot).expect("content").as_text(), Some("Rich"));
    }

    #[test]
    fn html_only_is_stripped() {
        let snapshot = ClipboardSnapshot::new().with_text(ClipboardFormat::Html, "<p><b>Hi</b> there</p>");
        assert_eq!(extract(&snapshot).expect("content").as_text(), Some("Hi there"));
    }

    #[test]
    fn utf16_text_is_decoded() {
        let snapshot = ClipboardSnapshot::new().with_text(ClipboardFormat::Utf16PlainText, " 你好 ");
        assert_eq!(extract(&snapshot).expect("content").as_text(), Some("你好"));
    }

    #[test]
    fn invalid_utf8_falls_through() {
        let snapshot = ClipboardSnapshot::new()
            .with_data(ClipboardFormat::PlainText, vec![0xff_u8, 0xfe, 0xfd])
            .with_text(ClipboardFormat::Html, "ok");
        assert_eq!(extract(&snapshot).expect("content").as_text(), Some("ok"));
    }

    #[test]
    fn empty_snapshot_extracts_nothing() {
        assert!(extract(&ClipboardSnapshot::new()).is_none());
        let blank = ClipboardSnapshot::new()
            .with_text(ClipboardFormat::PlainText, "   ")
            .with_text(ClipboardFormat::Html, "<p> </p>");
        assert!(extract(&blank).is_none());
    }
}
