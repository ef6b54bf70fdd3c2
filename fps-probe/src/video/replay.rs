// 时间戳记录回放
//
// 从JSON文件读取预先记录的帧到达时间（秒），逐条作为帧源输出。
// 文件格式：{"device": "/dev/video0", "timestamps": [0.0, 0.033, ...]}

use bytes::Bytes;
use chrono::Utc;
use common::{CaptureError, CaptureSettings, FrameBuffer, Timestamp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::source::FrameSource;

/// 时间戳记录文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampTrace {
    /// 记录来源（可选，仅用于日志）
    #[serde(default)]
    pub device: Option<String>,
    /// 帧到达时间（秒）
    pub timestamps: Vec<f64>,
}

impl TimestampTrace {
    fn into_timestamps(self) -> Result<Vec<Timestamp>, CaptureError> {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, &secs)| {
                Timestamp::try_from_secs_f64(secs).ok_or_else(|| CaptureError::InvalidTrace {
                    reason: format!("entry #{} is not a representable time offset: {}", i, secs),
                })
            })
            .collect()
    }
}

/// 回放帧源
pub struct ReplaySource {
    path: PathBuf,
    timestamps: Vec<Timestamp>,
    position: usize,
    settings: Option<CaptureSettings>,
    blank: Bytes,
}

impl ReplaySource {
    /// 打开记录文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let trace: TimestampTrace = serde_json::from_str(&content)?;

        if let Some(device) = &trace.device {
            info!("Replaying trace recorded from {}", device);
        }

        Self::from_trace(path, trace)
    }

    pub fn from_trace<P: AsRef<Path>>(path: P, trace: TimestampTrace) -> Result<Self, CaptureError> {
        let timestamps = trace.into_timestamps()?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            timestamps,
            position: 0,
            settings: None,
            blank: Bytes::new(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.timestamps.len() - self.position
    }
}

impl FrameSource for ReplaySource {
    fn describe(&self) -> String {
        format!(
            "trace {} ({} timestamps)",
            self.path.display(),
            self.timestamps.len()
        )
    }

    fn configure(&mut self, requested: &CaptureSettings) -> Result<CaptureSettings, CaptureError> {
        // 帧率由记录决定，这里只决定输出帧的形状
        let len = requested
            .frame_len()
            .ok_or_else(|| CaptureError::ConfigureFailed {
                reason: format!("frame size overflows for {}", requested),
            })?;
        self.blank = Bytes::from(vec![0u8; len]);
        self.settings = Some(requested.clone());
        Ok(requested.clone())
    }

    fn read_frame(&mut self) -> Result<(FrameBuffer, Timestamp), CaptureError> {
        let settings = self.settings.as_ref().ok_or_else(|| CaptureError::FrameGrabFailed {
            reason: "replay source is not configured".to_string(),
        })?;

        let timestamp = *self
            .timestamps
            .get(self.position)
            .ok_or(CaptureError::SourceExhausted {
                delivered: self.position,
            })?;

        let frame = FrameBuffer {
            width: settings.width,
            height: settings.height,
            channels: settings.color.channels(),
            data: self.blank.clone(),
            captured_at: Utc::now(),
        };

        self.position += 1;
        Ok((frame, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn trace(values: &[f64]) -> TimestampTrace {
        TimestampTrace {
            device: None,
            timestamps: values.to_vec(),
        }
    }

    #[test]
    fn test_replay_yields_trace_in_order() {
        let mut source = ReplaySource::from_trace("mem", trace(&[0.0, 0.5, 1.25])).unwrap();
        source.configure(&CaptureSettings::default()).unwrap();

        let (frame, t0) = source.read_frame().unwrap();
        assert_eq!(t0, Timestamp::ZERO);
        assert_eq!(frame.shape(), (480, 640, 3));

        let (_, t1) = source.read_frame().unwrap();
        let (_, t2) = source.read_frame().unwrap();
        assert_eq!(t1.as_duration(), Duration::from_millis(500));
        assert_eq!(t2.as_duration(), Duration::from_millis(1250));
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_replay_exhausted() {
        let mut source = ReplaySource::from_trace("mem", trace(&[0.0])).unwrap();
        source.configure(&CaptureSettings::default()).unwrap();
        source.read_frame().unwrap();

        assert!(matches!(
            source.read_frame(),
            Err(CaptureError::SourceExhausted { delivered: 1 })
        ));
    }

    #[test]
    fn test_replay_rejects_negative_entries() {
        let result = ReplaySource::from_trace("mem", trace(&[0.0, -1.0]));
        assert!(matches!(result, Err(CaptureError::InvalidTrace { .. })));

        let result = ReplaySource::from_trace("mem", trace(&[f64::NAN]));
        assert!(matches!(result, Err(CaptureError::InvalidTrace { .. })));
    }

    #[test]
    fn test_replay_rejects_out_of_range_entries() {
        let result = ReplaySource::from_trace("mem", trace(&[0.0, 1e20]));
        assert!(matches!(result, Err(CaptureError::InvalidTrace { .. })));

        let result = ReplaySource::from_trace("mem", trace(&[0.0, f64::INFINITY]));
        assert!(matches!(result, Err(CaptureError::InvalidTrace { .. })));
    }

    #[test]
    fn test_replay_rejects_oversized_frame() {
        let mut source = ReplaySource::from_trace("mem", trace(&[0.0, 0.5])).unwrap();
        let requested = CaptureSettings {
            width: u32::MAX,
            height: u32::MAX,
            ..CaptureSettings::default()
        };

        assert!(matches!(
            source.configure(&requested),
            Err(CaptureError::ConfigureFailed { .. })
        ));
    }

    #[test]
    fn test_replay_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcam.json");
        fs::write(
            &path,
            r#"{"device": "/dev/video0", "timestamps": [0.0, 0.033, 0.066]}"#,
        )
        .unwrap();

        let source = ReplaySource::open(&path).unwrap();
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_replay_open_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ReplaySource::open(&path),
            Err(CaptureError::SerdeError(_))
        ));
        assert!(matches!(
            ReplaySource::open(dir.path().join("missing.json")),
            Err(CaptureError::Io(_))
        ));
    }
}
