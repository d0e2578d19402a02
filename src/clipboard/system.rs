//! # 系统剪贴板适配（arboard）
//!
//! ## 实现思路
//!
//! - 每次操作创建新的 `arboard::Clipboard`，不跨线程持有平台句柄。
//! - **变更令牌**：Windows 使用 `GetClipboardSequenceNumber`；
//!   其他平台没有可移植的变更计数，使用"内容摘要令牌"：对当前文本、图片尺寸
//!   与按固定步长抽取的像素字节做 SHA-256 摘要并截取 64 位。内容不变则令牌不变，
//!   大图也只摘要有限字节。
//! - **快照**：图片对象（RGBA）、纯文本、HTML 三种表示。某种表示不存在时跳过；
//!   读取出错（如剪贴板被占用）时整个快照失败，交给下一次检测重试。
//! - **写入**：图片先在打开剪贴板之前解码为 RGBA，写入阶段只做整体替换；
//!   剪贴板被占用等可重试错误按指数退避有限重试。
//! - **恢复**：按快照写回图片对象、HTML（附带纯文本）或纯文本，都没有则清空。

use std::borrow::Cow;
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::content::CapturedImage;
use crate::error::HistoryError;

use super::{ChangeToken, ClipboardBackend, ClipboardFormat, ClipboardSnapshot, RawImage};

const WRITE_RETRIES: u32 = 3;
const WRITE_RETRY_BASE_DELAY_MS: u64 = 40;
const WRITE_RETRY_MAX_DELAY_MS: u64 = 400;

const TOKEN_IMAGE_PREFIX_BYTES: usize = 4096;
const TOKEN_IMAGE_SAMPLES: usize = 1024;
const TOKEN_IMAGE_SAMPLE_BYTES: usize = 16;

fn compute_retry_delay_ms(attempt: u32) -> u64 {
    let exp = 1_u64 << attempt.saturating_sub(1).min(6);
    WRITE_RETRY_BASE_DELAY_MS
        .saturating_mul(exp)
        .min(WRITE_RETRY_MAX_DELAY_MS)
}

fn is_retryable(error: &arboard::Error) -> bool {
    matches!(
        error,
        arboard::Error::ClipboardOccupied | arboard::Error::Unknown { .. }
    )
}

/// 读取时"该格式不存在"不算错误。
fn is_absent(error: &arboard::Error) -> bool {
    matches!(
        error,
        arboard::Error::ContentNotAvailable | arboard::Error::ConversionFailure
    )
}

/// 单个表示的读取结果：不存在为 `None`，其他错误向上传递。
fn read_representation<T>(what: &str, result: Result<T, arboard::Error>) -> Result<Option<T>, HistoryError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if is_absent(&err) => Ok(None),
        Err(err) => Err(HistoryError::Clipboard(format!("读取剪贴板{}失败: {}", what, err))),
    }
}

/// 令牌摘要用的图片字节：前缀整段保留，其余按固定步长抽取小块，末尾再补一块。
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn sampled_image_bytes(bytes: &[u8]) -> Cow<'_, [u8]> {
    let sampled_len = TOKEN_IMAGE_PREFIX_BYTES + TOKEN_IMAGE_SAMPLES * TOKEN_IMAGE_SAMPLE_BYTES;
    if bytes.len() <= sampled_len {
        return Cow::Borrowed(bytes);
    }

    let mut sampled = Vec::with_capacity(sampled_len + TOKEN_IMAGE_SAMPLE_BYTES);
    sampled.extend_from_slice(&bytes[..TOKEN_IMAGE_PREFIX_BYTES]);
    let stride = (bytes.len() - TOKEN_IMAGE_PREFIX_BYTES) / TOKEN_IMAGE_SAMPLES;
    for index in 0..TOKEN_IMAGE_SAMPLES {
        let start = TOKEN_IMAGE_PREFIX_BYTES + index * stride;
        sampled.extend_from_slice(&bytes[start..start + TOKEN_IMAGE_SAMPLE_BYTES]);
    }
    sampled.extend_from_slice(&bytes[bytes.len() - TOKEN_IMAGE_SAMPLE_BYTES..]);
    Cow::Owned(sampled)
}

fn open_clipboard() -> Result<arboard::Clipboard, HistoryError> {
    arboard::Clipboard::new().map_err(|e| HistoryError::Clipboard(e.to_string()))
}

/// 基于 `arboard` 的系统剪贴板。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn with_retry<T>(
        &self,
        operation: &str,
        mut op: impl FnMut(&mut arboard::Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, HistoryError> {
        let mut last_error = None;
        for attempt in 1..=WRITE_RETRIES {
            if attempt > 1 {
                let wait_ms = compute_retry_delay_ms(attempt - 1);
                log::debug!("🔄 {} 重试 {}/{}，等待 {}ms", operation, attempt, WRITE_RETRIES, wait_ms);
                thread::sleep(Duration::from_millis(wait_ms));
            }

            let mut clipboard = open_clipboard()?;
            match op(&mut clipboard) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let retryable = is_retryable(&err);
                    log::warn!(
                        "❌ {} 第 {} 次尝试失败: {}（retryable={}）",
                        operation,
                        attempt,
                        err,
                        retryable
                    );
                    last_error = Some(err.to_string());
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(HistoryError::Clipboard(format!(
            "{}失败: {}",
            operation,
            last_error.unwrap_or_else(|| "未知错误".to_string())
        )))
    }
}

#[cfg(not(target_os = "windows"))]
fn content_digest_token(clipboard: &mut arboard::Clipboard) -> Result<ChangeToken, HistoryError> {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();

    if let Some(text) = read_representation("文本", clipboard.get_text())? {
        hasher.update(b"text:");
        hasher.update(text.as_bytes());
    }

    if let Some(image) = read_representation("图片", clipboard.get_image())? {
        hasher.update(b"image:");
        hasher.update((image.width as u64).to_le_bytes());
        hasher.update((image.height as u64).to_le_bytes());
        hasher.update((image.bytes.len() as u64).to_le_bytes());
        hasher.update(sampled_image_bytes(&image.bytes));
    }

    let digest = hasher.finalize();
    let mut head = [0_u8; 8];
    head.copy_from_slice(&digest[..8]);
    Ok(ChangeToken(u64::from_le_bytes(head)))
}

impl ClipboardBackend for SystemClipboard {
    #[cfg(target_os = "windows")]
    fn change_token(&self) -> Result<ChangeToken, HistoryError> {
        use windows::Win32::System::DataExchange::GetClipboardSequenceNumber;

        let sequence = unsafe { GetClipboardSequenceNumber() };
        Ok(ChangeToken(u64::from(sequence)))
    }

    #[cfg(not(target_os = "windows"))]
    fn change_token(&self) -> Result<ChangeToken, HistoryError> {
        let mut clipboard = open_clipboard()?;
        content_digest_token(&mut clipboard)
    }

    fn read_snapshot(&self) -> Result<ClipboardSnapshot, HistoryError> {
        let mut clipboard = open_clipboard()?;
        let mut snapshot = ClipboardSnapshot::new();

        if let Some(image) = read_representation("图片", clipboard.get_image())? {
            snapshot = snapshot.with_image_object(RawImage {
                width: image.width as u32,
                height: image.height as u32,
                rgba: Bytes::from(image.bytes.into_owned()),
            });
        }

        if let Some(text) = read_representation("文本", clipboard.get_text())? {
            snapshot = snapshot.with_text(ClipboardFormat::PlainText, &text);
        }

        if let Some(html) = read_representation("HTML", clipboard.get().html())? {
            snapshot = snapshot.with_text(ClipboardFormat::Html, &html);
        }

        Ok(snapshot)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.with_retry("清空剪贴板", |clipboard| clipboard.clear())
    }

    fn write_text(&self, text: &str) -> Result<(), HistoryError> {
        self.with_retry("写入文本", |clipboard| clipboard.set_text(text))
    }

    fn write_image(&self, image: &CapturedImage) -> Result<(), HistoryError> {
        // 解码放在打开剪贴板之前，缩短占用窗口
        let rgba = image.to_rgba()?;
        let (width, height) = rgba.dimensions();
        let raw = rgba.into_raw();

        log::debug!("📋 准备写入图片 - {}x{}", width, height);
        self.with_retry("写入图片", |clipboard| {
            clipboard.set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Borrowed(raw.as_slice()),
            })
        })
    }

    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<(), HistoryError> {
        let text = snapshot
            .data(ClipboardFormat::PlainText)
            .map(|data| String::from_utf8_lossy(data).into_owned());
        let html = snapshot
            .data(ClipboardFormat::Html)
            .map(|data| String::from_utf8_lossy(data).into_owned());

        if let Some(image) = snapshot.image_object() {
            log::debug!("📋 恢复剪贴板图片 - {}x{}", image.width, image.height);
            return self.with_retry("恢复图片", |clipboard| {
                clipboard.set_image(arboard::ImageData {
                    width: image.width as usize,
                    height: image.height as usize,
                    bytes: Cow::Borrowed(image.rgba.as_ref()),
                })
            });
        }

        match (html, text) {
            (Some(html), alt) => self.with_retry("恢复 HTML", |clipboard| {
                clipboard.set().html(html.as_str(), alt.as_deref())
            }),
            (None, Some(text)) => self.with_retry("恢复文本", |clipboard| clipboard.set_text(text.as_str())),
            (None, None) => self.clear(),
        }
    }
}
