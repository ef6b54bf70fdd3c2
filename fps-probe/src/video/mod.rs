mod source;

// 模拟摄像头（无需采集设备）
mod synthetic;
pub use synthetic::SyntheticCamera;

// 时间戳记录回放
mod replay;
pub use replay::{ReplaySource, TimestampTrace};

// 真实摄像头（需要 v4l 特性）
#[cfg(all(target_os = "linux", feature = "v4l"))]
mod v4l_camera;
#[cfg(all(target_os = "linux", feature = "v4l"))]
pub use v4l_camera::V4lCamera;

pub use source::{open_source, FrameSource, RunClock};
