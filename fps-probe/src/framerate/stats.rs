// 帧间隔统计（诊断用）
//
// 不参与帧率估算，只在调试日志中体现帧间隔的抖动情况。

use common::Timestamp;
use std::time::Duration;

/// 帧间隔统计
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    /// 变异系数（标准差 / 平均间隔）
    pub coefficient_of_variation: f64,
}

impl IntervalStats {
    /// 计算 `samples[from..]` 内相邻样本的间隔统计，少于一个间隔时返回 None
    pub fn from_samples(samples: &[Timestamp], from: usize) -> Option<Self> {
        let window = samples.get(from..)?;
        let intervals: Vec<Duration> = window
            .windows(2)
            .map(|pair| pair[1].saturating_since(pair[0]))
            .collect();

        let count = intervals.len();
        let min = *intervals.iter().min()?;
        let max = *intervals.iter().max()?;
        let mean = intervals.iter().sum::<Duration>() / count as u32;

        let mean_secs = mean.as_secs_f64();
        let variance = intervals
            .iter()
            .map(|interval| {
                let diff = interval.as_secs_f64() - mean_secs;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        let coefficient_of_variation = if mean_secs > 0.0 {
            variance.sqrt() / mean_secs
        } else {
            0.0
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            coefficient_of_variation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_intervals() {
        let samples: Vec<Timestamp> = (0..10).map(|i| Timestamp::from_micros(i * 20_000)).collect();

        let stats = IntervalStats::from_samples(&samples, 1).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.min, Duration::from_millis(20));
        assert_eq!(stats.max, Duration::from_millis(20));
        assert!(stats.coefficient_of_variation < 1e-9);
    }

    #[test]
    fn test_jitter_raises_variation() {
        let samples: Vec<Timestamp> = [0u64, 30_000, 70_000, 100_000, 140_000]
            .iter()
            .map(|&us| Timestamp::from_micros(us))
            .collect();

        let stats = IntervalStats::from_samples(&samples, 0).unwrap();
        assert_eq!(stats.min, Duration::from_millis(30));
        assert_eq!(stats.max, Duration::from_millis(40));
        assert!(stats.coefficient_of_variation > 0.1);
    }

    #[test]
    fn test_too_few_samples() {
        let samples = vec![Timestamp::ZERO, Timestamp::from_micros(10)];
        assert!(IntervalStats::from_samples(&samples, 1).is_none());
        assert!(IntervalStats::from_samples(&samples, 5).is_none());
    }
}
