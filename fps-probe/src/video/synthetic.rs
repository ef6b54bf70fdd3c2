// 模拟摄像头
//
// 不依赖任何采集设备，按目标帧率生成填充数据的帧，用于验证探测流程。

use bytes::Bytes;
use chrono::Utc;
use common::{CaptureError, CaptureSettings, FrameBuffer, Timestamp};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::source::{FrameSource, RunClock};
use crate::config::ClockMode;

/// 剩余时间不足该值时不休眠
const THRES_WAIT: Duration = Duration::from_micros(3_000);
/// 提前唤醒的余量
const THRES_SKIP: Duration = Duration::from_micros(50);

/// 模拟摄像头
pub struct SyntheticCamera {
    device: u16,
    clock: ClockMode,
    run_clock: RunClock,
    settings: Option<CaptureSettings>,
    frame_len: usize,
    frame_count: u64,
    last_frame_started: Option<Instant>,
}

impl SyntheticCamera {
    pub fn new(device: u16, clock: ClockMode) -> Self {
        Self {
            device,
            clock,
            run_clock: RunClock::start(),
            settings: None,
            frame_len: 0,
            frame_count: 0,
            last_frame_started: None,
        }
    }

    fn frame_duration(fps: u32) -> Duration {
        Duration::from_nanos(1_000_000_000 / fps as u64)
    }

    /// 虚拟时钟下第 `frame` 帧的时间戳：frame / fps
    fn virtual_timestamp(frame: u64, fps: u32) -> Timestamp {
        Timestamp::from_duration(Duration::from_nanos(frame * 1_000_000_000 / fps as u64))
    }

    /// 休眠到下一帧，剩余时间太短时直接返回
    fn pace(&self, fps: u32) {
        let Some(started) = self.last_frame_started else {
            return;
        };

        let remaining = Self::frame_duration(fps).saturating_sub(started.elapsed());
        if remaining >= THRES_WAIT {
            thread::sleep(remaining - THRES_SKIP);
        }
    }

    fn fill_payload(&self) -> Bytes {
        let seed = self.frame_count;
        let data: Vec<u8> = (0..self.frame_len as u64).map(|i| ((seed + i) % 256) as u8).collect();
        Bytes::from(data)
    }
}

impl FrameSource for SyntheticCamera {
    fn describe(&self) -> String {
        format!("synthetic camera #{} ({:?} clock)", self.device, self.clock)
    }

    fn configure(&mut self, requested: &CaptureSettings) -> Result<CaptureSettings, CaptureError> {
        if requested.fps == 0 {
            return Err(CaptureError::ConfigureFailed {
                reason: "target frame rate must be greater than 0".to_string(),
            });
        }
        if requested.width == 0 || requested.height == 0 {
            return Err(CaptureError::ConfigureFailed {
                reason: format!(
                    "resolution must be non-zero, got {}x{}",
                    requested.width, requested.height
                ),
            });
        }

        let frame_len = requested
            .frame_len()
            .ok_or_else(|| CaptureError::ConfigureFailed {
                reason: format!("frame size overflows for {}", requested),
            })?;

        info!("🎥 Synthetic camera configured: {}", requested);
        info!(
            "  Frame interval: {:.3}ms",
            Self::frame_duration(requested.fps).as_secs_f64() * 1000.0
        );

        self.settings = Some(requested.clone());
        self.frame_len = frame_len;
        Ok(requested.clone())
    }

    fn read_frame(&mut self) -> Result<(FrameBuffer, Timestamp), CaptureError> {
        let settings = self.settings.clone().ok_or_else(|| CaptureError::FrameGrabFailed {
            reason: "synthetic camera is not configured".to_string(),
        })?;

        let timestamp = match self.clock {
            ClockMode::Virtual => Self::virtual_timestamp(self.frame_count, settings.fps),
            ClockMode::Paced => {
                self.pace(settings.fps);
                self.last_frame_started = Some(Instant::now());
                self.run_clock.now()
            }
        };

        let frame = FrameBuffer {
            width: settings.width,
            height: settings.height,
            channels: settings.color.channels(),
            data: self.fill_payload(),
            captured_at: Utc::now(),
        };

        if self.frame_count % settings.fps as u64 == 0 {
            debug!(
                "Synthetic frame #{} at {} ({} bytes)",
                self.frame_count,
                timestamp,
                frame.data.len()
            );
        }

        self.frame_count += 1;
        Ok((frame, timestamp))
    }
}
