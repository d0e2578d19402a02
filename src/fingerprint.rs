//! # 内容指纹
//!
//! 对 `CapturedContent` 的规范字节做 SHA-256，输出十六进制字符串，仅用于去重判等，
//! 不作为任何安全边界。
//!
//! 规范字节：文本为归一化后字符串的 UTF-8 字节；图片为捕获时的编码字节。
//!
//! 已知限制：未能编码的原始像素没有可导出字节，此时退化为随机标识，
//! 这样的条目永远无法与自身去重。

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::content::CapturedContent;

/// 内容指纹（十六进制）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 任意字节的 SHA-256 十六进制摘要。
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 计算内容指纹。
pub fn fingerprint(content: &CapturedContent) -> Fingerprint {
    match content {
        CapturedContent::Text { normalized } => Fingerprint::of_bytes(normalized.as_bytes()),
        CapturedContent::Image { image } => match image.exportable_bytes() {
            Some(bytes) => Fingerprint::of_bytes(bytes),
            None => {
                log::warn!(
                    "⚠️ 图片 ({}x{}) 无可导出字节，指纹退化为随机标识，该条目无法去重",
                    image.width(),
                    image.height()
                );
                Fingerprint::random()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CapturedImage;

    #[test]
    fn text_fingerprint_is_sha256_of_utf8() {
        let content = CapturedContent::text("abc").expect("non-empty");
        assert_eq!(
            fingerprint(&content).as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let content = CapturedContent::text("剪贴板 history").expect("non-empty");
        assert_eq!(fingerprint(&content), fingerprint(&content));
    }

    #[test]
    fn trailing_whitespace_normalizes_to_same_fingerprint() {
        let a = CapturedContent::text("abc").expect("non-empty");
        let b = CapturedContent::text("abc ").expect("non-empty");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn distinct_text_has_distinct_fingerprint() {
        let a = CapturedContent::text("abc").expect("non-empty");
        let b = CapturedContent::text("abd").expect("non-empty");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn raw_image_fingerprint_is_not_reproducible() {
        let image = CapturedImage::raw_rgba(1, 1, vec![1_u8, 2, 3, 4]).expect("1x1 rgba");
        let content = CapturedContent::image(image);
        let first = fingerprint(&content);
        let second = fingerprint(&content);
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
    }
}
