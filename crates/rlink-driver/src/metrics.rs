//! 会话指标
//!
//! 原子计数器，任何线程都可以无锁更新和读取。

use std::sync::atomic::{AtomicU64, Ordering};

/// 会话实时指标
///
/// # 使用示例
///
/// ```rust
/// use rlink_driver::SessionMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = SessionMetrics::new();
/// metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.commands_sent, 1);
/// ```
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// 桥接线程轮询次数
    pub bridge_ticks: AtomicU64,
    /// 成功下发的 setter 调用数
    pub commands_sent: AtomicU64,
    /// 失败的 setter 调用数（不重试）
    pub command_failures: AtomicU64,
    pub heartbeats_sent: AtomicU64,
    pub heartbeat_failures: AtomicU64,
    /// 完成的遥测刷新轮次
    pub telemetry_cycles: AtomicU64,
    /// 失败的遥测 getter 调用数（保留旧值）
    pub telemetry_failures: AtomicU64,
    /// 收到的链路事件通知数
    pub link_events: AtomicU64,
    /// 控制台执行的动作数
    pub actions_executed: AtomicU64,
    /// 无法识别的输入行数
    pub invalid_inputs: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 读取全部计数器
    ///
    /// 各计数器分别读取，相互之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bridge_ticks: self.bridge_ticks.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            command_failures: self.command_failures.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            heartbeat_failures: self.heartbeat_failures.load(Ordering::Relaxed),
            telemetry_cycles: self.telemetry_cycles.load(Ordering::Relaxed),
            telemetry_failures: self.telemetry_failures.load(Ordering::Relaxed),
            link_events: self.link_events.load(Ordering::Relaxed),
            actions_executed: self.actions_executed.load(Ordering::Relaxed),
            invalid_inputs: self.invalid_inputs.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub bridge_ticks: u64,
    pub commands_sent: u64,
    pub command_failures: u64,
    pub heartbeats_sent: u64,
    pub heartbeat_failures: u64,
    pub telemetry_cycles: u64,
    pub telemetry_failures: u64,
    pub link_events: u64,
    pub actions_executed: u64,
    pub invalid_inputs: u64,
}

impl MetricsSnapshot {
    /// setter 失败率（百分比），没有调用时为 0
    pub fn command_failure_rate(&self) -> f64 {
        let total = self.commands_sent + self.command_failures;
        if total == 0 {
            return 0.0;
        }
        (self.command_failures as f64 / total as f64) * 100.0
    }
}
