//! # 剪贴板历史引擎 — 命令行入口
//!
//! 在终端中运行剪贴板监听，直到 Ctrl-C。
//!
//! ```text
//! clipboard-history [settings.json]
//! ```
//!
//! 日志级别默认 `info`，可通过 `RUST_LOG` 覆盖。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clipboard_history_core::{
    ClipboardHistory, HistoryConfig, HistoryError, SystemAppIdentity, SystemClipboard,
};

const PREVIEW_LINES: usize = 3;

#[tokio::main]
async fn main() -> Result<(), HistoryError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            log::info!("读取设置文件: {}", path.display());
            HistoryConfig::load(&path)?
        }
        None => HistoryConfig::default(),
    };

    let history = ClipboardHistory::new(config, Arc::new(SystemClipboard), Arc::new(SystemAppIdentity));
    history.start_monitoring()?;

    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("❌ 等待退出信号失败: {}", err);
    }
    history.stop_monitoring();

    let entries = history.history();
    log::info!("📋 本次共记录 {} 条历史", entries.len());
    let now = Utc::now();
    for entry in &entries {
        log::info!(
            "  [{}] {} | {}",
            entry.relative_age(now),
            entry.source_app_name().unwrap_or("-"),
            entry.preview(PREVIEW_LINES).replace('\n', " ⏎ ")
        );
    }

    Ok(())
}
