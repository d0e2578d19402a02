//! # 图片平均色
//!
//! 为图片条目计算一个用于列表着色的代表色：
//! - 先缩小到不超过 80×80 再取 RGB 平均值。
//! - 近黑色（三个通道都小于 0.03）统一为中灰 0.5。
//! - 其余颜色亮度低于 0.5 时把亮度提到 0.5，饱和度按 `亮度 / 0.5` 同比缩小。
//!
//! 结果按指纹缓存（读多写少，读写锁 + 容量上限，超出时淘汰最久未写入的）。

use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fast_image_resize as fr;
use image::RgbaImage;
use image::imageops::FilterType;
use lru::LruCache;
use serde::Serialize;

use crate::config::COLOR_CACHE_SIZE_DEFAULT;
use crate::content::CapturedImage;
use crate::error::HistoryError;
use crate::fingerprint::Fingerprint;

const SAMPLE_MAX_DIMENSION: u32 = 80;
const NEAR_BLACK_THRESHOLD: f32 = 0.03;
const MIN_BRIGHTNESS: f32 = 0.5;

/// 0.0 ~ 1.0 的 RGB 颜色。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn grey(value: f32) -> Self {
        Self {
            r: value,
            g: value,
            b: value,
        }
    }

    /// `#rrggbb` 形式
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", channel(self.r), channel(self.g), channel(self.b))
    }

    fn to_hsv(self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;

        let hue = if delta <= f32::EPSILON {
            0.0
        } else if max == self.r {
            ((self.g - self.b) / delta).rem_euclid(6.0) / 6.0
        } else if max == self.g {
            ((self.b - self.r) / delta + 2.0) / 6.0
        } else {
            ((self.r - self.g) / delta + 4.0) / 6.0
        };
        let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
        (hue, saturation, max)
    }

    fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let c = value * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = value - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self {
            r: r + m,
            g: g + m,
            b: b + m,
        }
    }
}

/// 保证可读性的亮度修正。
fn ensure_min_brightness(average: Rgb) -> Rgb {
    if average.r < NEAR_BLACK_THRESHOLD && average.g < NEAR_BLACK_THRESHOLD && average.b < NEAR_BLACK_THRESHOLD {
        return Rgb::grey(MIN_BRIGHTNESS);
    }

    let (hue, saturation, brightness) = average.to_hsv();
    if brightness >= MIN_BRIGHTNESS {
        return average;
    }
    let saturation_scale = brightness / MIN_BRIGHTNESS;
    Rgb::from_hsv(hue, saturation * saturation_scale, MIN_BRIGHTNESS)
}

fn downsample(rgba: RgbaImage, width: u32, height: u32) -> RgbaImage {
    match downsample_fast(&rgba, width, height) {
        Ok(sample) => sample,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize：{}", err);
            image::imageops::resize(&rgba, width, height, FilterType::Triangle)
        }
    }
}

fn downsample_fast(rgba: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, HistoryError> {
    let (src_width, src_height) = rgba.dimensions();
    let src_image = fr::images::ImageRef::new(src_width, src_height, rgba.as_raw(), fr::PixelType::U8x4)
        .map_err(|e| HistoryError::Image(format!("构建源图像缓冲失败：{}", e)))?;
    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
    fr::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| HistoryError::Image(format!("fast_image_resize 执行失败：{}", e)))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| HistoryError::Image("fast_image_resize 输出缓冲长度异常".to_string()))
}

/// 计算图片的代表色。
pub fn average_color(image: &CapturedImage) -> Result<Rgb, HistoryError> {
    let rgba = image.to_rgba()?;
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(HistoryError::Image("图片尺寸为 0，无法取色".to_string()));
    }

    let scale = (SAMPLE_MAX_DIMENSION as f32 / width as f32)
        .min(SAMPLE_MAX_DIMENSION as f32 / height as f32)
        .min(1.0);
    let sample_width = ((width as f32 * scale) as u32).max(1);
    let sample_height = ((height as f32 * scale) as u32).max(1);
    let sample = if (sample_width, sample_height) == (width, height) {
        rgba
    } else {
        downsample(rgba, sample_width, sample_height)
    };

    let (mut red, mut green, mut blue) = (0_u64, 0_u64, 0_u64);
    for pixel in sample.pixels() {
        red += u64::from(pixel[0]);
        green += u64::from(pixel[1]);
        blue += u64::from(pixel[2]);
    }
    let total = (u64::from(sample.width()) * u64::from(sample.height())) as f32 * 255.0;
    let average = Rgb {
        r: red as f32 / total,
        g: green as f32 / total,
        b: blue as f32 / total,
    };

    Ok(ensure_min_brightness(average))
}

/// 以指纹为键的代表色缓存。
pub struct AverageColorCache {
    entries: RwLock<LruCache<Fingerprint, Rgb>>,
}

impl AverageColorCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<Fingerprint, Rgb>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("取色缓存锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<Fingerprint, Rgb>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("取色缓存锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn get(&self, key: &Fingerprint) -> Option<Rgb> {
        self.read().peek(key).copied()
    }

    pub fn insert(&self, key: Fingerprint, color: Rgb) {
        self.write().put(key, color);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.read().cap().get()
    }

    /// 命中缓存直接返回，否则计算并写入。计算在锁外进行。
    pub fn get_or_compute(&self, key: &Fingerprint, image: &CapturedImage) -> Result<Rgb, HistoryError> {
        if let Some(color) = self.get(key) {
            return Ok(color);
        }
        let color = average_color(image)?;
        self.insert(key.clone(), color);
        log::debug!("🎨 图片代表色 {} -> {}", key, color.to_hex());
        Ok(color)
    }
}

impl Default for AverageColorCache {
    fn default() -> Self {
        Self::new(COLOR_CACHE_SIZE_DEFAULT)
    }
}
