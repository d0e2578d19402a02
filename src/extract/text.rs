//! 文本表示的提取策略

use crate::clipboard::{ClipboardFormat, ClipboardSnapshot};
use crate::content::CapturedContent;

use super::rich_text::{strip_html, strip_rtf};

/// UTF-8 纯文本；非法 UTF-8 视为该表示不可用。
pub(super) fn plain_utf8(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    let data = snapshot.data(ClipboardFormat::PlainText)?;
    match std::str::from_utf8(data) {
        Ok(text) => CapturedContent::text(text),
        Err(err) => {
            log::debug!("纯文本表示不是合法 UTF-8: {}", err);
            None
        }
    }
}

/// UTF-16LE 纯文本，允许带 BOM。
pub(super) fn plain_utf16(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    let data = snapshot.data(ClipboardFormat::Utf16PlainText)?;
    if data.len() % 2 != 0 {
        log::debug!("UTF-16 表示长度为奇数 ({} 字节)，跳过", data.len());
        return None;
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let units = units.strip_prefix(&[0xFEFF]).unwrap_or(&units);
    let text = String::from_utf16(units).ok()?;
    CapturedContent::text(text.trim_end_matches('\0'))
}

pub(super) fn rtf(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    let data = snapshot.data(ClipboardFormat::Rtf)?;
    let raw = String::from_utf8_lossy(data);
    CapturedContent::text(&strip_rtf(&raw))
}

pub(super) fn html(snapshot: &ClipboardSnapshot) -> Option<CapturedContent> {
    let data = snapshot.data(ClipboardFormat::Html)?;
    let raw = String::from_utf8_lossy(data);
    CapturedContent::text(&strip_html(&raw))
}
