// 探测流程
//
// 配置帧源 -> 读取N帧并记录到达时间 -> 估算一次帧率。

use common::{CaptureSettings, Result, SampleSequence};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EstimateConfig;
use crate::framerate::{estimate_rate, IntervalStats, RateEstimate};
use crate::video::FrameSource;

/// 一次探测的结果
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub run_id: Uuid,
    pub source: String,
    /// 设备实际接受的采集参数
    pub negotiated: CaptureSettings,
    pub frames: usize,
    pub estimate: RateEstimate,
    pub interval_stats: Option<IntervalStats>,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Elapsed FPS: {}", self.estimate.fps)
    }
}

/// 执行一次探测
pub fn run_probe(
    source: &mut dyn FrameSource,
    requested: &CaptureSettings,
    estimate: &EstimateConfig,
) -> Result<ProbeReport> {
    let run_id = Uuid::new_v4();
    let description = source.describe();
    info!("🚀 Probe {} starting on {}", run_id, description);
    info!("  Requested: {}", requested);

    let negotiated = source.configure(requested)?;
    if negotiated != *requested {
        warn!("⚠️  Device adjusted capture settings: {}", negotiated);
    }

    let mut samples = SampleSequence::with_capacity(estimate.frames);
    while !samples.is_complete() {
        let (frame, timestamp) = source.read_frame()?;
        debug!(
            "Frame #{} shape {:?} at {} (captured {})",
            samples.len(),
            frame.shape(),
            timestamp,
            frame.captured_at.format("%H:%M:%S%.6f")
        );
        samples.push(timestamp)?;
    }
    info!("✓ Collected {} frame(s)", samples.len());

    let rate = estimate_rate(samples.as_slice(), &estimate.window())?;
    if rate.first != estimate.warmup || estimate.end.is_some_and(|end| end != rate.last) {
        warn!(
            "⚠️  Sample window clamped to #{}..#{} ({} frame(s) collected)",
            rate.first,
            rate.last,
            samples.len()
        );
    }

    let interval_stats = IntervalStats::from_samples(samples.as_slice(), rate.first);
    if let Some(stats) = &interval_stats {
        debug!(
            "Frame intervals: min {:.3}ms, mean {:.3}ms, max {:.3}ms (CV {:.4})",
            stats.min.as_secs_f64() * 1000.0,
            stats.mean.as_secs_f64() * 1000.0,
            stats.max.as_secs_f64() * 1000.0,
            stats.coefficient_of_variation
        );
    }

    info!(
        "✅ Probe {} finished: {:.3} fps over samples #{}..#{}",
        run_id, rate.fps, rate.first, rate.last
    );

    Ok(ProbeReport {
        run_id,
        source: description,
        negotiated,
        frames: samples.len(),
        estimate: rate,
        interval_stats,
    })
}
