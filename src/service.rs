//! # 剪贴板历史服务
//!
//! ## 设计思路
//!
//! 面向宿主的唯一入口。由宿主构造并持有（约定每个进程一个），不使用
//! 进程级单例：
//!
//! - `start_monitoring` / `stop_monitoring`：启动/停止后台轮询，均幂等。
//! - `history` / `replay` / `clear_history`：读取、回放、清空历史。
//! - `tick_now`：自带定时器的宿主可以直接驱动单次检测。
//! - `average_color`：图片条目的代表色（带缓存）。
//!
//! ## 实现思路
//!
//! 后台任务是一个 `tokio::time::interval` 循环，错过的周期顺延而不补发。
//! 每次检测放到阻塞线程池执行，平台剪贴板调用再慢也不会卡住异步运行时。
//! 停止通过 `watch` 通道通知；正在执行的检测会完整结束，之后不再触发。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::clipboard::{AppIdentityProvider, ClipboardBackend};
use crate::color::{AverageColorCache, Rgb};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::history::HistoryEntry;
use crate::monitor::{ClipboardMonitor, TickOutcome};

struct MonitorTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MonitorTask {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    fn signal_stop(&self) {
        if let Err(err) = self.stop_tx.send(true) {
            log::debug!("监听任务已退出，无需发送停止信号: {}", err);
        }
    }
}

/// 剪贴板历史服务。
pub struct ClipboardHistory {
    config: HistoryConfig,
    monitor: Arc<ClipboardMonitor>,
    colors: AverageColorCache,
    task: Mutex<Option<MonitorTask>>,
}

impl ClipboardHistory {
    pub fn new(
        config: HistoryConfig,
        backend: Arc<dyn ClipboardBackend>,
        identity: Arc<dyn AppIdentityProvider>,
    ) -> Self {
        let config = config.normalized();
        let monitor = Arc::new(ClipboardMonitor::new(&config, backend, identity));
        let colors = AverageColorCache::new(config.color_cache_size);
        Self {
            config,
            monitor,
            colors,
            task: Mutex::new(None),
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<MonitorTask>> {
        match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("监听任务状态锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// 启动后台轮询。已在运行时直接返回。
    ///
    /// 必须在 Tokio 运行时上下文中调用，否则返回 `RuntimeUnavailable`。
    pub fn start_monitoring(&self) -> Result<(), HistoryError> {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(MonitorTask::is_running) {
            log::debug!("剪贴板监听已在运行，忽略重复启动");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| HistoryError::RuntimeUnavailable)?;
        self.monitor.prime(self.config.capture_existing_on_start);

        let (stop_tx, stop_rx) = watch::channel(false);
        let period = self.config.poll_interval();
        let handle = runtime.spawn(run_monitor_loop(Arc::clone(&self.monitor), period, stop_rx));
        *task = Some(MonitorTask { stop_tx, handle });

        log::info!("🚀 剪贴板监听已启动，轮询间隔 {}ms", period.as_millis());
        Ok(())
    }

    /// 停止后台轮询。未运行时为无操作。
    pub fn stop_monitoring(&self) {
        let Some(task) = self.lock_task().take() else {
            return;
        };
        task.signal_stop();
        log::info!("🛑 剪贴板监听已停止");
    }

    pub fn is_monitoring(&self) -> bool {
        self.lock_task().as_ref().is_some_and(MonitorTask::is_running)
    }

    /// 同步执行一次检测。
    pub fn tick_now(&self) -> TickOutcome {
        self.monitor.tick()
    }

    /// 历史记录副本，最新在前。
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.monitor.history()
    }

    /// 把条目写回剪贴板。会阻塞在平台剪贴板调用上，异步宿主应放到阻塞线程池执行。
    pub fn replay(&self, id: Uuid) -> Result<(), HistoryError> {
        self.monitor.replay(id)
    }

    pub fn clear_history(&self) {
        self.monitor.clear_history();
    }

    /// 图片条目的代表色；条目不存在、不是图片或无法解码时返回 `None`。
    pub fn average_color(&self, id: Uuid) -> Option<Rgb> {
        let entry = self.monitor.find(id)?;
        let image = entry.content().as_image()?;
        match self.colors.get_or_compute(entry.fingerprint(), image) {
            Ok(color) => Some(color),
            Err(err) => {
                log::warn!("⚠️ 计算条目 {} 的代表色失败: {}", id, err);
                None
            }
        }
    }
}

impl Drop for ClipboardHistory {
    fn drop(&mut self) {
        if let Some(task) = self.lock_task().take() {
            task.signal_stop();
        }
    }
}

async fn run_monitor_loop(
    monitor: Arc<ClipboardMonitor>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let monitor = Arc::clone(&monitor);
                match tokio::task::spawn_blocking(move || monitor.tick()).await {
                    Ok(TickOutcome::Captured(id)) => log::trace!("本轮收录条目 {}", id),
                    Ok(_) => {}
                    Err(err) => log::error!("❌ 剪贴板检测任务异常: {}", err),
                }
            }
        }
    }

    log::debug!("剪贴板监听循环退出");
}
