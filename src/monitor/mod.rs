//! # 变更检测
//!
//! ## 设计思路
//!
//! 剪贴板只暴露一个不透明的变更令牌，因此检测是一个令牌比较状态机：
//!
//! ```text
//!        tick
//! Idle ───────▶ Checking ──┬─ 令牌未变          → Unchanged
//!   ▲                      ├─ 令牌/快照读取失败  → Unavailable（令牌不推进，下轮重试）
//!   │                      ├─ 等待重新同步       → Resynchronized（只采纳令牌）
//!   │                      └─ 令牌已变：采纳令牌 → 提取 → 插入
//!   │                                             ├─ Captured / Duplicate
//!   │                                             └─ NothingExtracted
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! - 提取失败时令牌照样推进，同一份无法识别的内容不会被反复检查。
//! - 回放写入后立即重读令牌并采纳（见 `playback`），引擎不会把自己写入的
//!   内容当作新的复制再次收录。
//!
//! ## 实现思路
//!
//! 历史存储与循环状态放在同一把互斥锁后面。一次检测、一次回放、一次清空
//! 各自只持锁一次，读者永远看不到修改到一半的状态；回放在写入与令牌采纳
//! 之间也不会被检测插入。

mod playback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::clipboard::{AppIdentityProvider, ChangeToken, ClipboardBackend};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::extract::Extractor;
use crate::history::{HistoryEntry, HistoryStore};

/// 检测循环的持久状态。
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    /// 最近一次采纳的令牌；`None` 表示从未见过令牌
    pub last_seen_token: Option<ChangeToken>,
    pub poll_interval: Duration,
    /// 下一次成功读取令牌时只采纳、不收录
    ///
    /// 已知缺口：从令牌重读失败到下一次检测之间若有外部复制，
    /// 这次复制的令牌会被直接采纳，内容不会进入历史。
    pub resync_pending: bool,
    consecutive_failures: u32,
}

/// 检测器当前阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    Checking,
}

/// 单次检测的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 令牌与上次相同
    Unchanged,
    /// 收录了新条目
    Captured(Uuid),
    /// 与头部条目重复，未收录
    Duplicate,
    /// 令牌已变但没有可用表示
    NothingExtracted,
    /// 采纳了令牌但未收录（回放后的重新同步或启动时的预热）
    Resynchronized,
    /// 剪贴板暂不可用，本轮放弃
    Unavailable,
}

#[derive(Debug)]
struct MonitorCore {
    store: HistoryStore,
    loop_state: LoopState,
}

/// 剪贴板变更检测器，持有历史存储。
pub struct ClipboardMonitor {
    backend: Arc<dyn ClipboardBackend>,
    identity: Arc<dyn AppIdentityProvider>,
    extractor: Extractor,
    checking: AtomicBool,
    core: Mutex<MonitorCore>,
}

impl ClipboardMonitor {
    pub fn new(
        config: &HistoryConfig,
        backend: Arc<dyn ClipboardBackend>,
        identity: Arc<dyn AppIdentityProvider>,
    ) -> Self {
        let loop_state = LoopState {
            poll_interval: config.poll_interval(),
            ..LoopState::default()
        };
        Self {
            backend,
            identity,
            extractor: Extractor::default(),
            checking: AtomicBool::new(false),
            core: Mutex::new(MonitorCore {
                store: HistoryStore::new(config.max_history_size),
                loop_state,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorCore> {
        match self.core.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("历史状态锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        if self.checking.load(Ordering::Acquire) {
            MonitorPhase::Checking
        } else {
            MonitorPhase::Idle
        }
    }

    /// 执行一次检测。同步调用，可能阻塞在平台剪贴板调用上。
    pub fn tick(&self) -> TickOutcome {
        let mut core = self.lock();
        self.checking.store(true, Ordering::Release);
        let outcome = self.check(&mut core);
        self.checking.store(false, Ordering::Release);
        log::debug!("🔁 剪贴板检测结果: {:?}", outcome);
        outcome
    }

    fn check(&self, core: &mut MonitorCore) -> TickOutcome {
        let token = match self.backend.change_token() {
            Ok(token) => token,
            Err(err) => return Self::unavailable(core, "读取变更令牌", &err),
        };

        if core.loop_state.resync_pending {
            core.loop_state.resync_pending = false;
            core.loop_state.last_seen_token = Some(token);
            Self::recovered(core);
            log::debug!("🔄 重新同步剪贴板令牌 {:?}", token);
            return TickOutcome::Resynchronized;
        }

        if core.loop_state.last_seen_token == Some(token) {
            Self::recovered(core);
            return TickOutcome::Unchanged;
        }

        let snapshot = match self.backend.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => return Self::unavailable(core, "读取剪贴板快照", &err),
        };
        Self::recovered(core);
        core.loop_state.last_seen_token = Some(token);

        let Some(content) = self.extractor.extract(&snapshot) else {
            log::debug!("剪贴板内容已变化，但没有可识别的表示");
            return TickOutcome::NothingExtracted;
        };

        let source = self.identity.current_foreground_app();
        if core.store.insert(content, source) {
            match core.store.head() {
                Some(entry) => TickOutcome::Captured(entry.id()),
                None => TickOutcome::Duplicate,
            }
        } else {
            TickOutcome::Duplicate
        }
    }

    fn unavailable(core: &mut MonitorCore, action: &str, err: &HistoryError) -> TickOutcome {
        core.loop_state.consecutive_failures = core.loop_state.consecutive_failures.saturating_add(1);
        if core.loop_state.consecutive_failures == 1 {
            log::warn!("⚠️ {}失败，下次检测重试: {}", action, err);
        } else {
            log::debug!(
                "{}仍然失败（连续 {} 次）: {}",
                action,
                core.loop_state.consecutive_failures,
                err
            );
        }
        TickOutcome::Unavailable
    }

    fn recovered(core: &mut MonitorCore) {
        if core.loop_state.consecutive_failures > 0 {
            log::info!(
                "✅ 剪贴板恢复可用（此前连续失败 {} 次）",
                core.loop_state.consecutive_failures
            );
            core.loop_state.consecutive_failures = 0;
        }
    }

    /// 启动前预热：从未见过令牌时采纳当前令牌而不收录。
    ///
    /// `capture_existing` 为真时保持未见状态，下一次检测会收录已有内容。
    /// 读取令牌失败时标记为待重新同步，效果相同。
    pub fn prime(&self, capture_existing: bool) {
        let mut core = self.lock();
        if core.loop_state.last_seen_token.is_some() || capture_existing {
            return;
        }
        match self.backend.change_token() {
            Ok(token) => {
                core.loop_state.last_seen_token = Some(token);
                log::debug!("启动预热，采纳当前令牌 {:?}", token);
            }
            Err(err) => {
                core.loop_state.resync_pending = true;
                log::warn!("⚠️ 预热读取令牌失败，等待下次检测重新同步: {}", err);
            }
        }
    }

    /// 历史记录副本，最新在前。
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().store.snapshot()
    }

    pub fn find(&self, id: Uuid) -> Option<HistoryEntry> {
        self.lock().store.get(id).cloned()
    }

    pub fn clear_history(&self) {
        self.lock().store.clear();
    }

    pub fn set_max_history_size(&self, max_size: usize) {
        self.lock().store.set_max_size(max_size);
    }

    /// 循环状态副本。
    pub fn loop_state(&self) -> LoopState {
        self.lock().loop_state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{ClipboardFormat, ClipboardSnapshot, MemoryClipboard, NoAppIdentity};

    fn monitor(max: usize) -> (Arc<MemoryClipboard>, ClipboardMonitor) {
        let clipboard = Arc::new(MemoryClipboard::new());
        let config = HistoryConfig {
            max_history_size: max,
            ..HistoryConfig::default()
        };
        let monitor = ClipboardMonitor::new(&config, clipboard.clone(), Arc::new(NoAppIdentity));
        (clipboard, monitor)
    }

    #[test]
    fn unchanged_token_is_a_no_op() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("a");
        assert!(matches!(monitor.tick(), TickOutcome::Captured(_)));
        assert_eq!(monitor.tick(), TickOutcome::Unchanged);
        assert_eq!(monitor.history().len(), 1);
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
    }

    #[test]
    fn same_content_copied_again_is_duplicate() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("foo");
        monitor.tick();
        clipboard.copy_external_text("foo");
        assert_eq!(monitor.tick(), TickOutcome::Duplicate);
        assert_eq!(monitor.history().len(), 1);
    }

    #[test]
    fn priming_skips_existing_content() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("already there");
        monitor.prime(false);
        assert_eq!(monitor.tick(), TickOutcome::Unchanged);
        assert!(monitor.history().is_empty());
    }

    #[test]
    fn priming_can_capture_existing_content() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("already there");
        monitor.prime(true);
        assert!(matches!(monitor.tick(), TickOutcome::Captured(_)));
    }

    #[test]
    fn failed_priming_resynchronizes_on_next_tick() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("already there");
        clipboard.fail_token_reads(1);
        monitor.prime(false);
        assert_eq!(monitor.tick(), TickOutcome::Resynchronized);
        assert!(monitor.history().is_empty());
    }

    #[test]
    fn extraction_failure_still_advances_token() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external(ClipboardSnapshot::new().with_text(ClipboardFormat::PlainText, "   "));
        assert_eq!(monitor.tick(), TickOutcome::NothingExtracted);
        assert_eq!(monitor.tick(), TickOutcome::Unchanged);
        assert_eq!(
            monitor.loop_state().last_seen_token,
            Some(clipboard.change_token().expect("token"))
        );
    }

    #[test]
    fn unavailable_snapshot_does_not_advance_token() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("later");
        clipboard.fail_snapshot_reads(1);
        assert_eq!(monitor.tick(), TickOutcome::Unavailable);
        assert_eq!(monitor.loop_state().last_seen_token, None);
        assert!(matches!(monitor.tick(), TickOutcome::Captured(_)));
    }

    #[test]
    fn unavailable_token_is_retried() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("x");
        clipboard.fail_token_reads(2);
        assert_eq!(monitor.tick(), TickOutcome::Unavailable);
        assert_eq!(monitor.tick(), TickOutcome::Unavailable);
        assert!(matches!(monitor.tick(), TickOutcome::Captured(_)));
    }

    #[test]
    fn captured_id_is_head() {
        let (clipboard, monitor) = monitor(10);
        clipboard.copy_external_text("x");
        let TickOutcome::Captured(id) = monitor.tick() else {
            panic!("expected capture");
        };
        assert_eq!(monitor.history()[0].id(), id);
        assert!(monitor.find(id).is_some());
    }

    #[test]
    fn shrinking_history_evicts_oldest() {
        let (clipboard, monitor) = monitor(10);
        for text in ["a", "b", "c"] {
            clipboard.copy_external_text(text);
            monitor.tick();
        }
        monitor.set_max_history_size(1);
        let history = monitor.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content().as_text(), Some("c"));
    }
}
