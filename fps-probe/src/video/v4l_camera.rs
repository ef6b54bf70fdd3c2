// V4L2 摄像头采集（Linux）
//
// 通过 mmap 缓冲队列取帧，帧到达时间使用本进程的单调时钟。

use bytes::Bytes;
use chrono::Utc;
use common::{CaptureError, CaptureSettings, FourCC, FrameBuffer, Timestamp};
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::Device;

use super::source::{FrameSource, RunClock};

/// mmap 缓冲区数量
const BUFFER_COUNT: u32 = 4;

pub struct V4lCamera {
    index: u16,
    device: Device,
    stream: Option<Stream<'static>>,
    settings: Option<CaptureSettings>,
    run_clock: RunClock,
}

impl V4lCamera {
    pub fn open(index: u16) -> Result<Self, CaptureError> {
        let device = Device::new(index as usize).map_err(|e| CaptureError::DeviceOpenFailed {
            device: format!("/dev/video{}", index),
            reason: e.to_string(),
        })?;

        Ok(Self {
            index,
            device,
            stream: None,
            settings: None,
            run_clock: RunClock::start(),
        })
    }

    fn configure_failed(e: std::io::Error) -> CaptureError {
        CaptureError::ConfigureFailed {
            reason: e.to_string(),
        }
    }
}

impl FrameSource for V4lCamera {
    fn describe(&self) -> String {
        format!("/dev/video{}", self.index)
    }

    fn configure(&mut self, requested: &CaptureSettings) -> Result<CaptureSettings, CaptureError> {
        let mut format = self.device.format().map_err(Self::configure_failed)?;
        if let Some(codec) = requested.codec {
            format.fourcc = v4l::FourCC::new(&codec.bytes());
        }
        format.width = requested.width;
        format.height = requested.height;

        let actual = self
            .device
            .set_format(&format)
            .map_err(Self::configure_failed)?;
        let params = self
            .device
            .set_params(&Parameters::with_fps(requested.fps))
            .map_err(Self::configure_failed)?;

        let interval = params.interval;
        let fps = if interval.numerator > 0 {
            interval.denominator / interval.numerator
        } else {
            0
        };
        debug!("Active format:\n{}", actual);

        let negotiated = CaptureSettings {
            codec: Some(FourCC::new(actual.fourcc.repr)),
            width: actual.width,
            height: actual.height,
            fps,
            color: requested.color,
        };
        info!("🎥 Camera configured: {}", negotiated);

        // 格式确定后再建立缓冲队列
        let stream = Stream::with_buffers(&self.device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(Self::configure_failed)?;
        self.stream = Some(stream);
        self.settings = Some(negotiated.clone());
        Ok(negotiated)
    }

    fn read_frame(&mut self) -> Result<(FrameBuffer, Timestamp), CaptureError> {
        let (stream, settings) = match (self.stream.as_mut(), self.settings.as_ref()) {
            (Some(stream), Some(settings)) => (stream, settings),
            _ => {
                return Err(CaptureError::FrameGrabFailed {
                    reason: "camera is not configured".to_string(),
                })
            }
        };

        let (buf, meta) = stream.next().map_err(|e| CaptureError::FrameGrabFailed {
            reason: e.to_string(),
        })?;
        let timestamp = self.run_clock.now();

        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            return Err(CaptureError::EmptyFrame);
        }

        let frame = FrameBuffer {
            width: settings.width,
            height: settings.height,
            channels: settings.color.channels(),
            data: Bytes::copy_from_slice(&buf[..used]),
            captured_at: Utc::now(),
        };
        Ok((frame, timestamp))
    }
}
