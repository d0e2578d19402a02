//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `HistoryError` 枚举，覆盖剪贴板读写、回放目标缺失、
//! 图片编解码、配置加载与运行时生命周期几类失败。
//!
//! 注意两类"失败"并不在此枚举中：
//! - **提取失败**：快照中没有可用表示，属于正常结果，由
//!   [`TickOutcome::NothingExtracted`](crate::monitor::TickOutcome) 表达。
//! - **指纹降级**：图片无法导出字节时使用随机指纹，仅记录告警日志。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 实现 `Serialize` 将错误序列化为字符串，便于展示层直接透传。

use serde::Serialize;
use uuid::Uuid;

/// 剪贴板历史引擎统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// 系统剪贴板读写失败（平台级错误，当前操作放弃，下一次轮询重试）
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 回放目标不存在（例如已被淘汰），对调用方而言是无操作结果
    #[error("历史记录中不存在条目: {0}")]
    EntryNotFound(Uuid),

    /// 图片解码 / 编码失败
    #[error("图片处理失败: {0}")]
    Image(String),

    /// 配置内容无效
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 在 Tokio 运行时之外启动监听
    #[error("剪贴板监听需要在 Tokio 运行时中启动")]
    RuntimeUnavailable,
}

impl From<image::ImageError> for HistoryError {
    fn from(error: image::ImageError) -> Self {
        HistoryError::Image(error.to_string())
    }
}

/// 展示层通常只需要人类可读的错误文本。
impl Serialize for HistoryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryError;
    use uuid::Uuid;

    #[test]
    fn error_serializes_as_display_string() {
        let err = HistoryError::Clipboard("busy".to_string());
        let json = serde_json::to_string(&err).expect("serialize error");
        assert_eq!(json, "\"剪贴板操作失败: busy\"");
    }

    #[test]
    fn entry_not_found_mentions_identity() {
        let id = Uuid::new_v4();
        let err = HistoryError::EntryNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
