//! 回放：把历史条目写回剪贴板
//!
//! 写入前先清空，之后整体写入条目的原始载荷（文本原样、图片原始字节），
//! 不做任何重新归一化。写入完成后重读令牌并采纳，避免下一次检测把这次
//! 写入当成外部复制再次收录。
//!
//! 回放失败时剪贴板保持原样：清空前先读取当前快照，清空成功但写入失败时
//! 用这份快照恢复；读不到快照则不动剪贴板，直接返回错误。

use uuid::Uuid;

use crate::clipboard::ClipboardSnapshot;
use crate::content::CapturedContent;
use crate::error::HistoryError;

use super::{ClipboardMonitor, MonitorCore};

impl ClipboardMonitor {
    /// 将指定条目写回剪贴板。条目不存在（例如已被淘汰）时返回 `EntryNotFound`。
    ///
    /// 整个过程持有状态锁，写入与令牌采纳之间不会插入检测。
    pub fn replay(&self, id: Uuid) -> Result<(), HistoryError> {
        let mut core = self.lock();
        let content = core
            .store
            .get(id)
            .map(|entry| entry.content().clone())
            .ok_or(HistoryError::EntryNotFound(id))?;

        let previous = self.backend.read_snapshot().map_err(|err| {
            log::warn!("⚠️ 回放前读取剪贴板失败，放弃回放 {}: {}", id, err);
            err
        })?;

        let written = self.write_content(&content, &previous);
        self.acknowledge_self_write(&mut core);

        match &written {
            Ok(()) => log::info!("📤 已回放历史条目 {} ({:?})", id, content.kind()),
            Err(err) => log::warn!("⚠️ 回放历史条目 {} 失败: {}", id, err),
        }
        written
    }

    fn write_content(&self, content: &CapturedContent, previous: &ClipboardSnapshot) -> Result<(), HistoryError> {
        self.backend.clear()?;
        let written = match content {
            CapturedContent::Text { normalized } => self.backend.write_text(normalized),
            CapturedContent::Image { image } => self.backend.write_image(image),
        };
        if written.is_err() {
            if let Err(err) = self.backend.restore(previous) {
                log::error!("❌ 回放失败后恢复原剪贴板内容失败: {}", err);
            }
        }
        written
    }

    /// 采纳自身写入后的令牌；读取失败时交给下一次检测重新同步。
    fn acknowledge_self_write(&self, core: &mut MonitorCore) {
        match self.backend.change_token() {
            Ok(token) => {
                core.loop_state.last_seen_token = Some(token);
                core.loop_state.resync_pending = false;
            }
            Err(err) => {
                core.loop_state.resync_pending = true;
                log::warn!("⚠️ 回放后读取令牌失败，等待下次检测重新同步: {}", err);
            }
        }
    }
}
