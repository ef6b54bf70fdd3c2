use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CaptureError, ConfigError};

/// 帧到达时间戳（相对于本次运行起点的偏移，单调）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_duration(offset: Duration) -> Self {
        Self(offset)
    }

    /// 调用方需保证 `secs` 为有限非负数且不超出 `Duration` 范围
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::from_secs_f64(secs))
    }

    /// 负数、NaN、无穷大或超出 `Duration` 范围时返回 `None`
    pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
        Duration::try_from_secs_f64(secs).ok().map(Self)
    }

    pub fn from_micros(micros: u64) -> Self {
        Self(Duration::from_micros(micros))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// 与更早时间戳之间的间隔，时间倒退时为零
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// 样本序列：每收到一帧追加一个时间戳，长度固定为N
#[derive(Debug, Clone)]
pub struct SampleSequence {
    samples: Vec<Timestamp>,
    capacity: usize,
}

impl SampleSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加一个时间戳
    ///
    /// 序列已满或时间戳早于上一个样本时返回错误，序列保持不变
    pub fn push(&mut self, timestamp: Timestamp) -> Result<(), CaptureError> {
        if self.is_complete() {
            return Err(CaptureError::SequenceFull {
                capacity: self.capacity,
            });
        }
        if let Some(last) = self.samples.last() {
            if timestamp < *last {
                return Err(CaptureError::NonMonotonic {
                    previous: last.as_duration(),
                    next: timestamp.as_duration(),
                });
            }
        }
        self.samples.push(timestamp);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn as_slice(&self) -> &[Timestamp] {
        &self.samples
    }
}

/// 四字符编码（FourCC），例如 "MJPG"、"YUYV"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourCC([u8; 4]);

impl FourCC {
    pub const MJPG: FourCC = FourCC(*b"MJPG");
    pub const YUYV: FourCC = FourCC(*b"YUYV");

    pub fn new(code: [u8; 4]) -> Self {
        Self(code)
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for FourCC {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(ConfigError::InvalidCodec {
                codec: s.to_string(),
            });
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl TryFrom<String> for FourCC {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FourCC> for String {
    fn from(code: FourCC) -> Self {
        code.to_string()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// 输出图像的颜色模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoColor {
    Grayscale,
    #[default]
    Color, // BGR
}

impl VideoColor {
    pub fn channels(&self) -> u32 {
        match self {
            Self::Grayscale => 1,
            Self::Color => 3,
        }
    }
}

/// 宽、高的上限（像素）
pub const MAX_DIMENSION: u32 = 16_384;

/// 采集参数（请求值或设备实际接受的值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub codec: Option<FourCC>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub color: VideoColor,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            codec: Some(FourCC::MJPG),
            width: 640,
            height: 480,
            fps: 30,
            color: VideoColor::Color,
        }
    }
}

impl CaptureSettings {
    /// 一帧解码后图像的字节数，溢出时返回 `None`
    pub fn frame_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.color.channels() as usize)
    }
}

impl fmt::Display for CaptureSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codec {
            Some(codec) => write!(f, "{} ", codec)?,
            None => write!(f, "(any) ")?,
        }
        write!(f, "{}x{} @ {}fps", self.width, self.height, self.fps)
    }
}

/// 一帧图像数据
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl FrameBuffer {
    /// (行, 列, 通道)
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sequence_push_in_order() {
        let mut seq = SampleSequence::with_capacity(3);
        seq.push(Timestamp::from_micros(0)).unwrap();
        seq.push(Timestamp::from_micros(10)).unwrap();
        // 重复时间戳允许（非递减）
        seq.push(Timestamp::from_micros(10)).unwrap();

        assert_eq!(seq.len(), 3);
        assert!(seq.is_complete());
    }

    #[test]
    fn test_sample_sequence_rejects_backwards_timestamp() {
        let mut seq = SampleSequence::with_capacity(4);
        seq.push(Timestamp::from_micros(100)).unwrap();

        let result = seq.push(Timestamp::from_micros(50));
        assert!(matches!(result, Err(CaptureError::NonMonotonic { .. })));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_sample_sequence_rejects_overflow() {
        let mut seq = SampleSequence::with_capacity(1);
        seq.push(Timestamp::ZERO).unwrap();

        let result = seq.push(Timestamp::from_micros(1));
        assert!(matches!(
            result,
            Err(CaptureError::SequenceFull { capacity: 1 })
        ));
    }

    #[test]
    fn test_fourcc_parse() {
        let code: FourCC = "MJPG".parse().unwrap();
        assert_eq!(code, FourCC::MJPG);
        assert_eq!(code.to_string(), "MJPG");

        assert!("MJP".parse::<FourCC>().is_err());
        assert!("MJPEG".parse::<FourCC>().is_err());
        assert!("MJ\u{e9}G".parse::<FourCC>().is_err());
        assert!(matches!(
            "H264X".parse::<FourCC>(),
            Err(ConfigError::InvalidCodec { .. })
        ));
    }

    #[test]
    fn test_capture_settings_frame_len() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.frame_len(), Some(640 * 480 * 3));

        let settings = CaptureSettings {
            width: u32::MAX,
            height: u32::MAX,
            ..CaptureSettings::default()
        };
        // 32位平台上乘法即溢出，64位平台上乘通道数时溢出
        assert_eq!(settings.frame_len(), None);
    }

    #[test]
    fn test_capture_settings_display() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.to_string(), "MJPG 640x480 @ 30fps");

        let settings = CaptureSettings {
            codec: None,
            ..CaptureSettings::default()
        };
        assert_eq!(settings.to_string(), "(any) 640x480 @ 30fps");
    }

    #[test]
    fn test_video_color_channels() {
        assert_eq!(VideoColor::Grayscale.channels(), 1);
        assert_eq!(VideoColor::default().channels(), 3);
    }

    #[test]
    fn test_timestamp_saturating_since() {
        let a = Timestamp::from_secs_f64(1.0);
        let b = Timestamp::from_secs_f64(2.5);
        assert_eq!(b.saturating_since(a), Duration::from_millis(1500));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn test_timestamp_try_from_secs_f64() {
        assert_eq!(
            Timestamp::try_from_secs_f64(0.5),
            Some(Timestamp::from_duration(Duration::from_millis(500)))
        );
        assert_eq!(Timestamp::try_from_secs_f64(-1.0), None);
        assert_eq!(Timestamp::try_from_secs_f64(f64::NAN), None);
        assert_eq!(Timestamp::try_from_secs_f64(f64::INFINITY), None);
        assert_eq!(Timestamp::try_from_secs_f64(1e20), None);
    }
}
