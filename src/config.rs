//! # 配置模块
//!
//! ## 设计思路
//!
//! 将历史引擎的可调参数集中到 `HistoryConfig`：历史容量、轮询间隔、
//! 启动时是否收录已有内容、取色缓存容量。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的默认值（容量 30、间隔 1500ms）。
//! - `from_settings` 从设置 JSON 中按 camelCase 键读取，缺失或类型不符时回退默认值。
//! - 所有数值在读取后统一夹紧到安全区间，避免极端值拖垮 CPU 或内存。
//! - `load` 读取设置文件，文件不存在时返回默认配置。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

pub const MAX_HISTORY_SIZE_DEFAULT: usize = 30;
const MAX_HISTORY_SIZE_MIN: usize = 1;
const MAX_HISTORY_SIZE_MAX: usize = 500;

pub const POLL_INTERVAL_DEFAULT_MS: u64 = 1_500;
const POLL_INTERVAL_MIN_MS: u64 = 100;
const POLL_INTERVAL_MAX_MS: u64 = 60_000;

pub const COLOR_CACHE_SIZE_DEFAULT: usize = 20;
const COLOR_CACHE_SIZE_MIN: usize = 1;
const COLOR_CACHE_SIZE_MAX: usize = 256;

/// 历史引擎配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// 历史记录最大条数，超出后从最旧一端淘汰。
    pub max_history_size: usize,
    /// 轮询剪贴板变更令牌的间隔（毫秒）。
    ///
    /// 间隔越短捕获延迟越低，但 CPU / 电量开销越高。
    pub poll_interval_millis: u64,
    /// 启动监听时是否把剪贴板中已有的内容收录为第一条历史。
    pub capture_existing_on_start: bool,
    /// 平均色缓存容量。
    pub color_cache_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_size: MAX_HISTORY_SIZE_DEFAULT,
            poll_interval_millis: POLL_INTERVAL_DEFAULT_MS,
            capture_existing_on_start: false,
            color_cache_size: COLOR_CACHE_SIZE_DEFAULT,
        }
    }
}

fn normalize_max_history_size(value: usize) -> usize {
    value.clamp(MAX_HISTORY_SIZE_MIN, MAX_HISTORY_SIZE_MAX)
}

fn normalize_poll_interval_ms(value_ms: u64) -> u64 {
    value_ms.clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS)
}

fn normalize_color_cache_size(value: usize) -> usize {
    value.clamp(COLOR_CACHE_SIZE_MIN, COLOR_CACHE_SIZE_MAX)
}

impl HistoryConfig {
    /// 将所有字段夹紧到允许区间。
    pub fn normalized(mut self) -> Self {
        self.max_history_size = normalize_max_history_size(self.max_history_size);
        self.poll_interval_millis = normalize_poll_interval_ms(self.poll_interval_millis);
        self.color_cache_size = normalize_color_cache_size(self.color_cache_size);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    /// 从应用设置 JSON 中读取配置。
    ///
    /// 每个键独立回退：某个键缺失或类型不对，不影响其他键。
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        let defaults = Self::default();

        let max_history_size = settings
            .get("maxHistorySize")
            .and_then(|v| v.as_u64())
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
            .unwrap_or(defaults.max_history_size);
        let poll_interval_millis = settings
            .get("pollIntervalMillis")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.poll_interval_millis);
        let capture_existing_on_start = settings
            .get("captureExistingOnStart")
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.capture_existing_on_start);
        let color_cache_size = settings
            .get("colorCacheSize")
            .and_then(|v| v.as_u64())
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
            .unwrap_or(defaults.color_cache_size);

        let config = Self {
            max_history_size,
            poll_interval_millis,
            capture_existing_on_start,
            color_cache_size,
        }
        .normalized();

        log::debug!(
            "📋 历史配置已加载: 容量={} 轮询间隔={}ms",
            config.max_history_size,
            config.poll_interval_millis
        );
        config
    }

    /// 读取 JSON 设置文件。
    ///
    /// # 返回
    /// - 文件不存在：默认配置
    /// - 文件存在但不是合法 JSON：`HistoryError::Config`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("设置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<serde_json::Value>(&content)
            .map_err(|e| HistoryError::Config(format!("解析设置文件失败: {}", e)))?;

        Ok(Self::from_settings(&parsed))
    }
}
