use common::{CaptureSettings, ConfigError, ProbeError, Result, MAX_DIMENSION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::framerate::{SampleWindow, DEFAULT_WARMUP};

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "fps-probe.toml";

/// 探测工具配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 帧源设置
    pub source: SourceConfig,

    /// 采集参数（编码、分辨率、目标帧率、颜色）
    pub capture: CaptureSettings,

    /// 采样与估算设置
    pub estimate: EstimateConfig,

    /// 日志设置
    pub logging: LoggingConfig,
}

/// 帧源类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// V4L2 摄像头 /dev/video<N>
    #[default]
    Camera,
    /// 生成的模拟摄像头
    Synthetic,
    /// 回放时间戳记录文件
    Replay,
}

/// 模拟摄像头的时钟模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// 第i帧的时间戳恰好是 i / fps，不休眠
    #[default]
    Virtual,
    /// 按目标帧率休眠，用单调时钟打时间戳
    Paced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// 设备编号
    pub device: u16,

    /// 回放文件路径（相对于配置文件所在目录）
    pub trace: Option<PathBuf>,

    pub clock: ClockMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// 读取的帧数N
    pub frames: usize,

    /// 跳过的预热样本数
    pub warmup: usize,

    /// 窗口终点下标（默认 N-1）
    pub end: Option<usize>,

    /// 名义间隔数K（默认 end - warmup）
    pub intervals: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)，RUST_LOG 优先
    pub level: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Camera,
            device: 0,
            trace: None,
            clock: ClockMode::Virtual,
        }
    }
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            frames: 32,
            warmup: DEFAULT_WARMUP,
            end: None,
            intervals: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EstimateConfig {
    pub fn window(&self) -> SampleWindow {
        SampleWindow {
            warmup: self.warmup,
            end: self.end,
            intervals: self.intervals,
        }
    }
}

impl FromStr for SourceKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "camera" => Ok(Self::Camera),
            "synthetic" => Ok(Self::Synthetic),
            "replay" => Ok(Self::Replay),
            other => Err(ProbeError::configuration(format!(
                "Unknown source kind: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Camera => "camera",
            Self::Synthetic => "synthetic",
            Self::Replay => "replay",
        };
        f.write_str(name)
    }
}

impl FromStr for ClockMode {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "virtual" => Ok(Self::Virtual),
            "paced" => Ok(Self::Paced),
            other => Err(ProbeError::configuration(format!(
                "Unknown clock mode: {}",
                other
            ))),
        }
    }
}

impl ProbeConfig {
    /// 从TOML文件加载配置
    ///
    /// 只做解析，校验留到环境变量和命令行覆盖之后
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        let capture = &self.capture;
        if capture.width == 0 || capture.height == 0 {
            return Err(ProbeError::configuration(format!(
                "Capture resolution must be non-zero, got {}x{}",
                capture.width, capture.height
            )));
        }

        if capture.width > MAX_DIMENSION || capture.height > MAX_DIMENSION {
            return Err(ProbeError::configuration(format!(
                "Capture resolution {}x{} exceeds the {}px limit",
                capture.width, capture.height, MAX_DIMENSION
            )));
        }

        if capture.fps == 0 {
            return Err(ProbeError::configuration(
                "Target frame rate must be greater than 0",
            ));
        }

        let estimate = &self.estimate;
        if estimate.frames < 2 {
            return Err(ProbeError::configuration(format!(
                "At least 2 frames are required, got {}",
                estimate.frames
            )));
        }

        if let Some(end) = estimate.end {
            if end >= estimate.frames {
                return Err(ProbeError::configuration(format!(
                    "End index {} is out of range for {} frames",
                    end, estimate.frames
                )));
            }
        }

        // 未指定终点时取最后一帧
        let end = estimate.end.unwrap_or(estimate.frames - 1);
        if end <= estimate.warmup {
            return Err(ProbeError::configuration(format!(
                "End index {} must be greater than warm-up offset {}",
                end, estimate.warmup
            )));
        }

        match estimate.intervals {
            Some(0) => {
                return Err(ProbeError::configuration(
                    "Interval count must be greater than 0",
                ));
            }
            Some(k) if k as usize >= estimate.frames => {
                return Err(ProbeError::configuration(format!(
                    "Interval count {} must be less than the frame count {}",
                    k, estimate.frames
                )));
            }
            _ => {}
        }

        if self.source.kind == SourceKind::Replay && self.source.trace.is_none() {
            return Err(ProbeError::configuration(
                "Replay source requires a trace file",
            ));
        }

        Ok(())
    }
}

/// 环境变量覆盖配置
pub struct EnvConfigOverride;

impl EnvConfigOverride {
    /// 用进程环境变量覆盖配置
    pub fn apply_overrides(config: &mut ProbeConfig) {
        Self::apply_with(config, |key| std::env::var(key).ok());
    }

    /// 用给定的查找函数覆盖配置，无法解析的值被忽略
    pub fn apply_with<F>(config: &mut ProbeConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(device) = lookup("FPS_PROBE_DEVICE").and_then(|v| v.parse::<u16>().ok()) {
            config.source.device = device;
        }

        if let Some(frames) = lookup("FPS_PROBE_FRAMES").and_then(|v| v.parse::<usize>().ok()) {
            config.estimate.frames = frames;
        }

        if let Some(fps) = lookup("FPS_PROBE_FPS").and_then(|v| v.parse::<u32>().ok()) {
            config.capture.fps = fps;
        }

        if let Some(level) = lookup("FPS_PROBE_LOG_LEVEL") {
            config.logging.level = level;
        }
    }
}
