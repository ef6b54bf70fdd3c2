// 帧率估算模块
//
// - `estimate_rate`: 根据帧到达时间戳的首尾样本估算帧率
// - `IntervalStats`: 帧间隔统计，仅用于诊断

pub mod estimator;
pub mod stats;

pub use estimator::{estimate_rate, RateEstimate, SampleWindow, DEFAULT_WARMUP};
pub use stats::IntervalStats;
