//! Dispatcher 指标收集模块
//!
//! Prometheus 指标 (通过 `metrics` facade) 与内存聚合统计。

use metrics::{counter, gauge, histogram};
use std::collections::HashMap;

/// 投递方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// 单条立即发送 (HIGH)
    Single,
    /// 批量发送
    Batch,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batch => "batch",
        }
    }
}

/// 记录消息提交
pub fn record_submission(destination: &str, priority: &str) {
    counter!(
        "notify_dispatch_submitted_total",
        "destination" => destination.to_string(),
        "priority" => priority.to_string()
    )
    .increment(1);
}

/// 记录去重命中
pub fn record_duplicate(destination: &str) {
    counter!(
        "notify_dispatch_duplicates_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// 记录配置错误 (未知 destination / 未配置 endpoint)
pub fn record_configuration_error(destination: &str) {
    counter!(
        "notify_dispatch_configuration_errors_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// 记录一次传输调用
pub fn record_delivery(
    destination: &str,
    mode: DeliveryMode,
    messages: usize,
    success: bool,
    latency_ms: f64,
) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "notify_dispatch_deliveries_total",
        "destination" => destination.to_string(),
        "mode" => mode.as_str(),
        "status" => status
    )
    .increment(1);

    if success {
        counter!(
            "notify_dispatch_messages_delivered_total",
            "destination" => destination.to_string()
        )
        .increment(messages as u64);
    }

    histogram!(
        "notify_dispatch_delivery_latency_ms",
        "mode" => mode.as_str()
    )
    .record(latency_ms);

    if mode == DeliveryMode::Batch {
        histogram!("notify_dispatch_batch_size").record(messages as f64);
    }
}

/// 记录批量 flush 失败丢失的消息
pub fn record_flush_failure(destination: &str, lost: usize) {
    counter!(
        "notify_dispatch_flush_failures_total",
        "destination" => destination.to_string()
    )
    .increment(1);
    counter!(
        "notify_dispatch_messages_lost_total",
        "destination" => destination.to_string()
    )
    .increment(lost as u64);
}

/// 记录缓冲区深度
pub fn record_buffer_depth(destination: &str, depth: usize) {
    gauge!(
        "notify_dispatch_buffer_depth",
        "destination" => destination.to_string()
    )
    .set(depth as f64);
}

/// 记录去重缓存大小
pub fn record_dedup_size(size: usize) {
    gauge!("notify_dispatch_dedup_entries").set(size as f64);
}

/// 投递统计聚合器
///
/// 在内存中聚合投递结果，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatsAggregator {
    /// 单条发送次数
    pub single_sends: u64,

    /// 批量发送次数
    pub batches: u64,

    /// 成功投递的消息数
    pub messages_delivered: u64,

    /// 失败的传输调用次数
    pub failed_calls: u64,

    /// 因批量失败丢失的消息数
    pub messages_lost: u64,

    /// 批大小统计
    pub batch_size_stats: RunningStats,

    /// 调用延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各 destination 失败次数
    pub failures_by_destination: HashMap<String, u64>,
}

impl DeliveryStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(
        &mut self,
        destination: &str,
        mode: DeliveryMode,
        messages: usize,
        success: bool,
        latency_ms: f64,
    ) {
        match mode {
            DeliveryMode::Single => self.single_sends += 1,
            DeliveryMode::Batch => {
                self.batches += 1;
                self.batch_size_stats.record(messages as f64);
            }
        }

        self.latency_stats.record(latency_ms);

        if success {
            self.messages_delivered += messages as u64;
        } else {
            self.failed_calls += 1;
            if mode == DeliveryMode::Batch {
                self.messages_lost += messages as u64;
            }
            *self
                .failures_by_destination
                .entry(destination.to_string())
                .or_insert(0) += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DeliverySummary {
        let calls = self.single_sends + self.batches;
        DeliverySummary {
            single_sends: self.single_sends,
            batches: self.batches,
            messages_delivered: self.messages_delivered,
            failed_calls: self.failed_calls,
            messages_lost: self.messages_lost,
            failure_rate: if calls > 0 {
                self.failed_calls as f64 / calls as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
            failures_by_destination: self.failures_by_destination.clone(),
        }
    }
}

/// 投递摘要
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub single_sends: u64,
    pub batches: u64,
    pub messages_delivered: u64,
    pub failed_calls: u64,
    pub messages_lost: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub latency_ms: StatsSummary,
    pub failures_by_destination: HashMap<String, u64>,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Single sends: {}", self.single_sends)?;
        writeln!(f, "Batches: {}", self.batches)?;
        writeln!(f, "Messages delivered: {}", self.messages_delivered)?;
        writeln!(
            f,
            "Failed calls: {} ({:.2}%)",
            self.failed_calls, self.failure_rate
        )?;
        writeln!(f, "Messages lost: {}", self.messages_lost)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.failures_by_destination.is_empty() {
            writeln!(f, "Failures by destination:")?;
            for (destination, count) in &self.failures_by_destination {
                writeln!(f, "  {}: {}", destination, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        let (min, max) = stats.range().unwrap_or_default();
        Self {
            count: stats.count(),
            min,
            max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Welford 在线均值/方差，记录批大小与延迟
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    sum_sq_dev: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn record(&mut self, sample: f64) {
        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_sq_dev += delta * (sample - self.mean);
        self.range = Some(match self.range {
            Some((lo, hi)) => (lo.min(sample), hi.max(sample)),
            None => (sample, sample),
        });
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// 0 when nothing was recorded
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 样本标准差；少于两个样本时为 0
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.sum_sq_dev / (self.count - 1) as f64).sqrt()
    }

    /// `(min, max)` of the recorded samples
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        assert_eq!(stats.range(), None);
        assert_eq!(stats.std_dev(), 0.0);

        for v in [4.0, 1.0, 5.0, 2.0, 3.0] {
            stats.record(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert_eq!(stats.range(), Some((1.0, 5.0)));
        assert!((stats.std_dev() - 2.5_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = DeliveryStatsAggregator::new();

        aggregator.update("emailNotifications", DeliveryMode::Single, 1, true, 3.0);
        aggregator.update("emailNotifications", DeliveryMode::Batch, 10, true, 8.0);
        aggregator.update("audit", DeliveryMode::Batch, 4, false, 12.0);

        assert_eq!(aggregator.single_sends, 1);
        assert_eq!(aggregator.batches, 2);
        assert_eq!(aggregator.messages_delivered, 11);
        assert_eq!(aggregator.failed_calls, 1);
        assert_eq!(aggregator.messages_lost, 4);
        assert_eq!(aggregator.failures_by_destination.get("audit"), Some(&1));
        assert_eq!(aggregator.batch_size_stats.count(), 2);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DeliveryStatsAggregator::new();
        aggregator.update("emailNotifications", DeliveryMode::Batch, 3, true, 5.0);
        aggregator.update("emailNotifications", DeliveryMode::Single, 1, false, 5.0);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Batches: 1"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("emailNotifications: 1"));
    }
}
