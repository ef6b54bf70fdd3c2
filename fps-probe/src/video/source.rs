// 帧源抽象
//
// 每个后端负责：打开设备、协商采集参数、逐帧读取并给出到达时间戳。

use common::{CaptureError, CaptureSettings, FrameBuffer, Timestamp};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::config::{SourceConfig, SourceKind};

use super::replay::ReplaySource;
use super::synthetic::SyntheticCamera;

/// 帧源
pub trait FrameSource {
    /// 人类可读的设备描述，用于日志
    fn describe(&self) -> String;

    /// 协商采集参数，返回设备实际接受的参数
    fn configure(&mut self, requested: &CaptureSettings) -> Result<CaptureSettings, CaptureError>;

    /// 阻塞读取下一帧及其到达时间戳
    fn read_frame(&mut self) -> Result<(FrameBuffer, Timestamp), CaptureError>;
}

/// 单调时钟：以创建时刻为起点
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    epoch: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::from_duration(self.epoch.elapsed())
    }
}

/// 按配置打开帧源
///
/// `base_dir` 用于解析回放文件的相对路径
pub fn open_source(
    config: &SourceConfig,
    base_dir: &Path,
) -> Result<Box<dyn FrameSource>, CaptureError> {
    let source: Box<dyn FrameSource> = match config.kind {
        SourceKind::Synthetic => Box::new(SyntheticCamera::new(config.device, config.clock)),
        SourceKind::Replay => {
            let trace = config.trace.as_ref().ok_or_else(|| CaptureError::InvalidTrace {
                reason: "no trace file configured".to_string(),
            })?;
            Box::new(ReplaySource::open(base_dir.join(trace))?)
        }
        SourceKind::Camera => open_camera(config.device)?,
    };

    info!("✓ Frame source opened: {}", source.describe());
    Ok(source)
}

#[cfg(all(target_os = "linux", feature = "v4l"))]
fn open_camera(device: u16) -> Result<Box<dyn FrameSource>, CaptureError> {
    Ok(Box::new(super::v4l_camera::V4lCamera::open(device)?))
}

#[cfg(not(all(target_os = "linux", feature = "v4l")))]
fn open_camera(device: u16) -> Result<Box<dyn FrameSource>, CaptureError> {
    Err(CaptureError::BackendUnavailable {
        backend: format!(
            "V4L2 camera /dev/video{} (rebuild on Linux with `--features v4l`)",
            device
        ),
    })
}
