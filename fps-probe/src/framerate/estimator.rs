// 帧率估算器实现
//
// 只取采样窗口的首尾两个时间戳：rate = K / (t[end] - t[warmup])。
// 不对逐帧间隔求平均，间隔统计见 `stats` 模块（仅用于诊断日志）。

use common::{EstimateError, Timestamp};
use std::time::Duration;
use tracing::debug;

/// 默认跳过的预热样本数
pub const DEFAULT_WARMUP: usize = 1;

/// 采样窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    /// 跳过的预热样本数（窗口起点下标）
    pub warmup: usize,
    /// 窗口终点下标，None 表示最后一个样本
    pub end: Option<usize>,
    /// 名义间隔数K，None 表示 end - warmup
    pub intervals: Option<u32>,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self {
            warmup: DEFAULT_WARMUP,
            end: None,
            intervals: None,
        }
    }
}

/// 帧率估算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEstimate {
    /// 帧率（帧/秒）
    pub fps: f64,
    /// 实际使用的窗口起点下标
    pub first: usize,
    /// 实际使用的窗口终点下标
    pub last: usize,
    /// 名义间隔数
    pub intervals: u32,
    /// 首尾样本之间的耗时
    pub elapsed: Duration,
}

/// 根据样本序列估算帧率
///
/// 终点下标超出范围时截断为 N-1；预热偏移截断为 end-1，
/// 保证窗口内至少保留一个间隔。纯函数，对同一序列重复调用结果相同。
///
/// # 错误
///
/// * `InsufficientSamples` - 样本少于2个
/// * `DivisionByZero` - 首尾样本时间戳相同
pub fn estimate_rate(
    samples: &[Timestamp],
    window: &SampleWindow,
) -> Result<RateEstimate, EstimateError> {
    let n = samples.len();
    if n < 2 {
        return Err(EstimateError::InsufficientSamples { available: n });
    }

    let last = window.end.map_or(n - 1, |end| end.min(n - 1)).max(1);
    let first = window.warmup.min(last - 1);
    let intervals = window.intervals.unwrap_or((last - first) as u32);

    let elapsed = samples[last].saturating_since(samples[first]);
    if elapsed.is_zero() {
        return Err(EstimateError::DivisionByZero { first, last });
    }

    let fps = intervals as f64 / elapsed.as_secs_f64();
    debug!(
        "Estimated {:.3} fps from samples #{}..#{} ({} intervals over {:.6}s)",
        fps,
        first,
        last,
        intervals,
        elapsed.as_secs_f64()
    );

    Ok(RateEstimate {
        fps,
        first,
        last,
        intervals,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[f64]) -> Vec<Timestamp> {
        values.iter().map(|&s| Timestamp::from_secs_f64(s)).collect()
    }

    #[test]
    fn test_one_fps_over_thirty_two_samples() {
        let samples: Vec<Timestamp> = (0..32).map(|i| Timestamp::from_secs_f64(i as f64)).collect();
        let window = SampleWindow {
            warmup: 1,
            end: Some(31),
            intervals: Some(30),
        };

        let estimate = estimate_rate(&samples, &window).unwrap();
        assert_eq!(estimate.fps, 1.0);
        assert_eq!(estimate.first, 1);
        assert_eq!(estimate.last, 31);
        assert_eq!(estimate.elapsed, Duration::from_secs(30));
    }

    #[test]
    fn test_default_window_matches_explicit() {
        let samples: Vec<Timestamp> = (0..32).map(|i| Timestamp::from_secs_f64(i as f64)).collect();

        let estimate = estimate_rate(&samples, &SampleWindow::default()).unwrap();
        assert_eq!(estimate.fps, 1.0);
        assert_eq!(estimate.intervals, 30);
    }

    #[test]
    fn test_single_sample_is_insufficient() {
        let samples = secs(&[0.0]);
        let result = estimate_rate(&samples, &SampleWindow::default());
        assert_eq!(
            result,
            Err(EstimateError::InsufficientSamples { available: 1 })
        );

        let result = estimate_rate(&[], &SampleWindow::default());
        assert_eq!(
            result,
            Err(EstimateError::InsufficientSamples { available: 0 })
        );
    }

    #[test]
    fn test_duplicate_endpoints_divide_by_zero() {
        let samples = secs(&[0.0, 1.0, 1.0]);
        let window = SampleWindow {
            warmup: 1,
            end: Some(2),
            intervals: None,
        };

        let result = estimate_rate(&samples, &window);
        assert_eq!(
            result,
            Err(EstimateError::DivisionByZero { first: 1, last: 2 })
        );
    }

    #[test]
    fn test_two_samples_keep_one_interval() {
        // 预热偏移被截断，窗口退化为 [0, 1]
        let samples = secs(&[0.0, 0.5]);

        let estimate = estimate_rate(&samples, &SampleWindow::default()).unwrap();
        assert_eq!(estimate.first, 0);
        assert_eq!(estimate.last, 1);
        assert_eq!(estimate.fps, 2.0);
    }

    #[test]
    fn test_end_index_clamped_to_last_sample() {
        let samples = secs(&[0.0, 0.1, 0.2, 0.3]);
        let window = SampleWindow {
            warmup: 1,
            end: Some(100),
            intervals: None,
        };

        let estimate = estimate_rate(&samples, &window).unwrap();
        assert_eq!(estimate.last, 3);
        assert_eq!(estimate.intervals, 2);
        assert!((estimate.fps - 10.0).abs() < 1e-6, "FPS: {}", estimate.fps);
    }

    #[test]
    fn test_only_endpoints_matter() {
        // 中间样本抖动不影响结果
        let steady = secs(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let jittery = secs(&[0.0, 1.0, 1.1, 3.9, 4.0]);

        let a = estimate_rate(&steady, &SampleWindow::default()).unwrap();
        let b = estimate_rate(&jittery, &SampleWindow::default()).unwrap();
        assert_eq!(a.fps, b.fps);
    }

    #[test]
    fn test_increasing_sequences_give_positive_finite_rate() {
        for n in 2..40usize {
            let samples: Vec<Timestamp> = (0..n)
                .map(|i| Timestamp::from_micros((i * i * 1_000 + i) as u64))
                .collect();

            let estimate = estimate_rate(&samples, &SampleWindow::default()).unwrap();
            assert!(estimate.fps > 0.0, "n={} fps={}", n, estimate.fps);
            assert!(estimate.fps.is_finite(), "n={} fps={}", n, estimate.fps);
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let samples: Vec<Timestamp> = (0..32)
            .map(|i| Timestamp::from_micros(i * 33_333 + (i % 3) * 150))
            .collect();
        let window = SampleWindow::default();

        let first = estimate_rate(&samples, &window).unwrap();
        let second = estimate_rate(&samples, &window).unwrap();
        assert_eq!(first, second);
    }
}
