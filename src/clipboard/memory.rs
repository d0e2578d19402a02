//! 进程内剪贴板
//!
//! 令牌为每次整体替换递增的计数器，行为与平台变更计数一致。
//! 支持故障注入，用于覆盖"外部资源不可用"等分支。

use std::sync::{Mutex, MutexGuard};

use crate::content::{CapturedImage, ImageFormat};
use crate::error::HistoryError;

use super::{ChangeToken, ClipboardBackend, ClipboardFormat, ClipboardSnapshot, RawImage};

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: ClipboardSnapshot,
    change_count: u64,
    write_count: u64,
    failing_token_reads: u32,
    failing_snapshot_reads: u32,
    fail_writes: bool,
    fail_content_writes: bool,
}

/// 进程内剪贴板实现。
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("内存剪贴板状态锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    fn replace(state: &mut MemoryState, snapshot: ClipboardSnapshot) {
        state.snapshot = snapshot;
        state.change_count = state.change_count.wrapping_add(1);
    }

    /// 模拟其他进程写入剪贴板。
    pub fn copy_external(&self, snapshot: ClipboardSnapshot) {
        let mut state = self.lock();
        Self::replace(&mut state, snapshot);
    }

    /// 模拟其他进程复制一段纯文本。
    pub fn copy_external_text(&self, text: &str) {
        self.copy_external(ClipboardSnapshot::new().with_text(ClipboardFormat::PlainText, text));
    }

    /// 当前内容（用于断言）。
    pub fn current_snapshot(&self) -> ClipboardSnapshot {
        self.lock().snapshot.clone()
    }

    /// 引擎通过 `write_text` / `write_image` 写入的次数。
    pub fn write_count(&self) -> u64 {
        self.lock().write_count
    }

    /// 接下来 `count` 次读取令牌失败。
    pub fn fail_token_reads(&self, count: u32) {
        self.lock().failing_token_reads = count;
    }

    /// 接下来 `count` 次读取快照失败。
    pub fn fail_snapshot_reads(&self, count: u32) {
        self.lock().failing_snapshot_reads = count;
    }

    /// 之后所有写入（含清空）是否失败。
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// 之后写文本 / 写图片是否失败（清空与恢复不受影响）。
    pub fn fail_content_writes(&self, fail: bool) {
        self.lock().fail_content_writes = fail;
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn change_token(&self) -> Result<ChangeToken, HistoryError> {
        let mut state = self.lock();
        if state.failing_token_reads > 0 {
            state.failing_token_reads -= 1;
            return Err(HistoryError::Clipboard("读取变更令牌失败（注入）".to_string()));
        }
        Ok(ChangeToken(state.change_count))
    }

    fn read_snapshot(&self) -> Result<ClipboardSnapshot, HistoryError> {
        let mut state = self.lock();
        if state.failing_snapshot_reads > 0 {
            state.failing_snapshot_reads -= 1;
            return Err(HistoryError::Clipboard("读取剪贴板快照失败（注入）".to_string()));
        }
        Ok(state.snapshot.clone())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(HistoryError::Clipboard("清空剪贴板失败（注入）".to_string()));
        }
        Self::replace(&mut state, ClipboardSnapshot::new());
        Ok(())
    }

    fn write_text(&self, text: &str) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if state.fail_writes || state.fail_content_writes {
            return Err(HistoryError::Clipboard("写入文本失败（注入）".to_string()));
        }
        let snapshot = ClipboardSnapshot::new().with_text(ClipboardFormat::PlainText, text);
        Self::replace(&mut state, snapshot);
        state.write_count += 1;
        Ok(())
    }

    fn write_image(&self, image: &CapturedImage) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if state.fail_writes || state.fail_content_writes {
            return Err(HistoryError::Clipboard("写入图片失败（注入）".to_string()));
        }
        let snapshot = match image.format() {
            ImageFormat::Png => {
                ClipboardSnapshot::new().with_data(ClipboardFormat::Png, image.bytes().clone())
            }
            ImageFormat::RawRgba => ClipboardSnapshot::new().with_image_object(RawImage {
                width: image.width(),
                height: image.height(),
                rgba: image.bytes().clone(),
            }),
            _ => ClipboardSnapshot::new().with_data(ClipboardFormat::Bitmap, image.bytes().clone()),
        };
        Self::replace(&mut state, snapshot);
        state.write_count += 1;
        Ok(())
    }

    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(HistoryError::Clipboard("恢复剪贴板失败（注入）".to_string()));
        }
        Self::replace(&mut state, snapshot.clone());
        Ok(())
    }
}
