use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clipboard::AppIdentity;
use crate::content::{CapturedContent, ContentKind};
use crate::fingerprint::Fingerprint;

/// 历史条目，构造后不可变。
///
/// 去重只看 (种类, 指纹)；`id` 与 `captured_at` 从不参与比较。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    id: Uuid,
    content: CapturedContent,
    captured_at: DateTime<Utc>,
    fingerprint: Fingerprint,
    source_app_name: Option<String>,
    source_bundle_id: Option<String>,
}

impl HistoryEntry {
    pub(crate) fn new(content: CapturedContent, fingerprint: Fingerprint, source: AppIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            captured_at: Utc::now(),
            fingerprint,
            source_app_name: source.name,
            source_bundle_id: source.bundle_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &CapturedContent {
        &self.content
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn source_app_name(&self) -> Option<&str> {
        self.source_app_name.as_deref()
    }

    pub fn source_bundle_id(&self) -> Option<&str> {
        self.source_bundle_id.as_deref()
    }

    /// 与候选内容是否视为重复。
    pub(crate) fn is_duplicate_of(&self, kind: ContentKind, fingerprint: &Fingerprint) -> bool {
        self.kind() == kind && &self.fingerprint == fingerprint
    }

    /// 列表展示用的预览：文本取前 `max_lines` 行，超出时追加 `...`；图片为 `"Image"`。
    pub fn preview(&self, max_lines: usize) -> String {
        match &self.content {
            CapturedContent::Text { normalized } => {
                let lines: Vec<&str> = normalized.lines().collect();
                if lines.len() <= max_lines {
                    normalized.clone()
                } else {
                    format!("{}...", lines[..max_lines].join("\n"))
                }
            }
            CapturedContent::Image { .. } => "Image".to_string(),
        }
    }

    /// 相对时间描述：`now` / `5m ago` / `3h ago` / `2d ago`，取最大的非零单位。
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.captured_at);
        if elapsed.num_days() > 0 {
            format!("{}d ago", elapsed.num_days())
        } else if elapsed.num_hours() > 0 {
            format!("{}h ago", elapsed.num_hours())
        } else if elapsed.num_minutes() > 0 {
            format!("{}m ago", elapsed.num_minutes())
        } else {
            "now".to_string()
        }
    }
}
