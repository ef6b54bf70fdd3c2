use std::time::Duration;
use thiserror::Error;

/// 帧率估算错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("Insufficient samples: {available} (need at least 2)")]
    InsufficientSamples { available: usize },

    #[error("Division by zero: samples #{first} and #{last} carry the same timestamp")]
    DivisionByZero { first: usize, last: usize },
}

/// 采集源错误（设备、回放文件、样本收集）
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open capture device {device}: {reason}")]
    DeviceOpenFailed { device: String, reason: String },

    #[error("Capture configuration rejected: {reason}")]
    ConfigureFailed { reason: String },

    #[error("Frame grab failed: {reason}")]
    FrameGrabFailed { reason: String },

    #[error("Empty frame received")]
    EmptyFrame,

    #[error("Frame source exhausted after {delivered} frame(s)")]
    SourceExhausted { delivered: usize },

    #[error("Invalid timestamp trace: {reason}")]
    InvalidTrace { reason: String },

    #[error("Timestamp went backwards: {previous:?} -> {next:?}")]
    NonMonotonic { previous: Duration, next: Duration },

    #[error("Sample sequence already holds {capacity} timestamp(s)")]
    SequenceFull { capacity: usize },

    #[error("Capture backend not available in this build: {backend}")]
    BackendUnavailable { backend: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// 配置错误（配置文件、环境变量、命令行）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse config file: {reason}")]
    ParseFailed { reason: String },

    #[error("Invalid codec {codec:?}: expected exactly four ASCII characters")]
    InvalidCodec { codec: String },

    #[error("{message}")]
    InvalidValue { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }
}

/// 探测流程的顶层错误
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Estimate error: {0}")]
    Estimate(#[from] EstimateError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ProbeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(ConfigError::invalid(message))
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
