//! 剪贴板能力模块
//!
//! # 设计思路
//!
//! 系统剪贴板对引擎而言是一个不透明的外部能力：
//! - **变更令牌**：廉价、非阻塞、可按相等比较，内容被替换时变化
//! - **快照**：按格式标识查询各个表示（位图、PNG、图片对象、文本、RTF、HTML）
//! - **写入**：清空 / 写文本 / 写图片 / 按快照恢复，每次都是整体替换
//!
//! 应用来源（前台应用名称与标识）同样是外部查询，失败时两个字段都为 `None`，
//! 不阻塞捕获。
//!
//! # 实现思路
//!
//! - `ClipboardBackend` / `AppIdentityProvider` 两个 trait 作为接缝，
//!   引擎只依赖 trait 对象，便于替换平台实现与测试替身。
//! - `system`：基于 `arboard` 的系统剪贴板适配（Windows 使用原生序列号作为令牌）。
//! - `memory`：进程内剪贴板，计数器令牌 + 故障注入，供测试与无界面宿主使用。
//! - `foreground`：前台应用查询（Windows 原生实现，其他平台返回 `None`）。

mod foreground;
mod memory;
mod system;

use bytes::Bytes;
use serde::Serialize;

use crate::content::CapturedImage;
use crate::error::HistoryError;

pub use foreground::{NoAppIdentity, SystemAppIdentity};
pub use memory::MemoryClipboard;
pub use system::SystemClipboard;

/// 剪贴板变更令牌。
///
/// 只保证"内容被替换后与之前不相等"，不保证单调或可比较大小。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeToken(pub u64);

/// 快照中可查询的表示格式（按格式标识）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardFormat {
    /// 平台主位图格式的编码字节（如 TIFF / BMP）
    Bitmap,
    /// PNG 编码字节
    Png,
    /// UTF-8 纯文本
    PlainText,
    /// UTF-16LE 纯文本
    Utf16PlainText,
    /// RTF 富文本
    Rtf,
    /// HTML 超文本
    Html,
}

/// 平台暴露的通用图片对象（未编码的 RGBA 像素）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
}

/// 某一时刻剪贴板内容的只读快照。
#[derive(Debug, Clone, Default)]
pub struct ClipboardSnapshot {
    representations: Vec<(ClipboardFormat, Bytes)>,
    image_object: Option<RawImage>,
}

impl ClipboardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一种格式的数据；同一格式重复追加时后者覆盖前者。
    pub fn with_data(mut self, format: ClipboardFormat, data: impl Into<Bytes>) -> Self {
        self.representations.retain(|(existing, _)| *existing != format);
        self.representations.push((format, data.into()));
        self
    }

    /// 以 UTF-8 文本形式追加（`Utf16PlainText` 会编码为 UTF-16LE）。
    pub fn with_text(self, format: ClipboardFormat, text: &str) -> Self {
        match format {
            ClipboardFormat::Utf16PlainText => {
                let encoded: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
                self.with_data(format, encoded)
            }
            _ => self.with_data(format, text.as_bytes().to_vec()),
        }
    }

    pub fn with_image_object(mut self, image: RawImage) -> Self {
        self.image_object = Some(image);
        self
    }

    pub fn data(&self, format: ClipboardFormat) -> Option<&Bytes> {
        self.representations
            .iter()
            .find(|(existing, _)| *existing == format)
            .map(|(_, data)| data)
    }

    pub fn image_object(&self) -> Option<&RawImage> {
        self.image_object.as_ref()
    }

    pub fn formats(&self) -> impl Iterator<Item = ClipboardFormat> + '_ {
        self.representations.iter().map(|(format, _)| *format)
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty() && self.image_object.is_none()
    }
}

/// 外部剪贴板能力。
///
/// 实现必须可跨线程共享；所有方法都应快速返回，不做长时间阻塞 I/O。
pub trait ClipboardBackend: Send + Sync {
    /// 读取当前变更令牌
    fn change_token(&self) -> Result<ChangeToken, HistoryError>;

    /// 读取当前内容快照
    fn read_snapshot(&self) -> Result<ClipboardSnapshot, HistoryError>;

    /// 清空剪贴板
    fn clear(&self) -> Result<(), HistoryError>;

    /// 以纯文本整体替换剪贴板内容
    fn write_text(&self, text: &str) -> Result<(), HistoryError>;

    /// 以原生图片对象整体替换剪贴板内容
    fn write_image(&self, image: &CapturedImage) -> Result<(), HistoryError>;

    /// 用先前读取的快照恢复剪贴板（回放写入失败后使用）
    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<(), HistoryError>;
}

/// 内容来源应用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppIdentity {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
}

/// 前台应用查询。
pub trait AppIdentityProvider: Send + Sync {
    fn current_foreground_app(&self) -> AppIdentity;
}
