//! # 剪贴板历史引擎 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 宿主（CLI / 托盘 / UI 层）                │
//! │                                                          │
//! │   history() · replay(id) · clear_history()               │
//! │   start_monitoring() · stop_monitoring() · tick_now()    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, HistoryError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕          service::ClipboardHistory               │
//! │                                                          │
//! │  ┌─ monitor ──── 令牌比较状态机 + 回放（自写抑制）        │
//! │  │   ├─ extract      快照 → 内容（图片 > 文本 > 富文本）  │
//! │  │   ├─ fingerprint  SHA-256 内容指纹                    │
//! │  │   └─ history      有界历史，头部去重                   │
//! │  │                                                       │
//! │  ├─ color ──────── 图片代表色 + 读写锁缓存               │
//! │  ├─ config ─────── HistoryConfig（夹紧后的可调参数）     │
//! │  └─ error ──────── HistoryError（统一错误类型）          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ ClipboardBackend / AppIdentityProvider
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  clipboard ── SystemClipboard (arboard) · MemoryClipboard │
//! │               SystemAppIdentity · NoAppIdentity           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `HistoryError` |
//! | [`config`] | 历史容量、轮询间隔等参数的读取与夹紧 |
//! | [`content`] | 归一化后的捕获内容（文本 / 图片） |
//! | [`fingerprint`] | 内容指纹，用于头部去重 |
//! | [`clipboard`] | 剪贴板与前台应用的外部能力接缝及平台适配 |
//! | [`extract`] | 按优先级从快照中提取内容 |
//! | [`history`] | 有界、最新在前的历史存储 |
//! | [`monitor`] | 变更检测与回放 |
//! | [`service`] | 面向宿主的服务入口与后台轮询任务 |
//! | [`color`] | 图片条目的代表色与缓存 |

pub mod error;
pub mod config;
pub mod content;
pub mod fingerprint;
pub mod clipboard;
pub mod extract;
pub mod history;
pub mod monitor;
pub mod service;
pub mod color;

pub use clipboard::{
    AppIdentity, AppIdentityProvider, ChangeToken, ClipboardBackend, ClipboardFormat, ClipboardSnapshot,
    MemoryClipboard, NoAppIdentity, RawImage, SystemAppIdentity, SystemClipboard,
};
pub use color::{AverageColorCache, Rgb};
pub use config::HistoryConfig;
pub use content::{CapturedContent, CapturedImage, ContentKind, ImageFormat};
pub use error::HistoryError;
pub use fingerprint::{Fingerprint, fingerprint};
pub use history::{HistoryEntry, HistoryStore};
pub use monitor::{ClipboardMonitor, LoopState, MonitorPhase, TickOutcome};
pub use service::ClipboardHistory;
