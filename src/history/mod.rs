//! # 历史存储
//!
//! ## 设计思路
//!
//! 有界、按时间倒序（最新在索引 0）的条目序列：
//! - **插入**：只与当前头部比较 (种类, 指纹)，相同则不插入。
//!   不做全局去重：之后再次复制同样的内容，会合法地成为新的头部条目。
//! - **截断**：插入后从最旧一端淘汰，长度始终不超过容量。
//! - **快照**：返回副本，读者永远看不到修改到一半的序列。
//!
//! 条目构造后不可变；存储只在进程内存活，不做持久化。

mod entry;

use std::collections::VecDeque;

use uuid::Uuid;

use crate::clipboard::AppIdentity;
use crate::content::CapturedContent;
use crate::fingerprint::fingerprint;

pub use entry::HistoryEntry;

/// 有界历史存储。
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    max_size: usize,
}

impl HistoryStore {
    /// `max_size` 为 0 时按 1 处理。
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// 插入候选内容；与头部重复时返回 `false` 且不做任何修改。
    pub fn insert(&mut self, candidate: CapturedContent, source: AppIdentity) -> bool {
        let fp = fingerprint(&candidate);
        if let Some(head) = self.entries.front() {
            if head.is_duplicate_of(candidate.kind(), &fp) {
                log::debug!("⏭️  与头部条目重复，跳过 ({})", fp);
                return false;
            }
        }

        let entry = HistoryEntry::new(candidate, fp, source);
        log::info!(
            "📋 新增历史条目 {} ({:?}, 来源: {})",
            entry.id(),
            entry.kind(),
            entry.source_app_name().unwrap_or("未知")
        );
        self.entries.push_front(entry);
        self.truncate();
        true
    }

    fn truncate(&mut self) {
        while self.entries.len() > self.max_size {
            if let Some(evicted) = self.entries.pop_back() {
                log::debug!("🗑️ 淘汰最旧条目 {}", evicted.id());
            }
        }
    }

    /// 清空全部条目。
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::info!("🧹 清空历史记录（{} 条）", self.entries.len());
        }
        self.entries.clear();
    }

    /// 最新在前的只读副本。
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 调整容量；缩小时立即淘汰多余的旧条目。
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        self.truncate();
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::config::MAX_HISTORY_SIZE_DEFAULT)
    }
}
