//! 设备端心跳看门狗
//!
//! 真实设备在主机停止调用 `heartbeat()` 一段时间后以超时错误断开链路，
//! 模拟设备用它复现这一行为。

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// 心跳看门狗
#[derive(Debug)]
pub struct HeartbeatWatchdog {
    last_beat: Mutex<Instant>,
    timeout: Duration,
}

impl HeartbeatWatchdog {
    /// 创建时视为刚收到一次心跳
    ///
    /// ```
    /// # use rlink_device::HeartbeatWatchdog;
    /// # use std::time::Duration;
    /// let watchdog = HeartbeatWatchdog::new(Duration::from_secs(1));
    /// assert!(!watchdog.is_expired());
    /// ```
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_beat: Mutex::new(Instant::now()),
            timeout,
        }
    }

    pub fn feed(&self) {
        *self.last_beat.lock() = Instant::now();
    }

    /// 距上次心跳已超过超时时间
    pub fn is_expired(&self) -> bool {
        self.since_last_beat() >= self.timeout
    }

    pub fn since_last_beat(&self) -> Duration {
        self.last_beat.lock().elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fresh_watchdog_not_expired() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_secs(1));
        assert!(!watchdog.is_expired());
    }

    #[test]
    fn test_expires_without_feed() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_millis(30));
        thread::sleep(Duration::from_millis(60));
        assert!(watchdog.is_expired());
    }

    #[test]
    fn test_feed_restarts_deadline() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_millis(200));
        thread::sleep(Duration::from_millis(50));
        watchdog.feed();
        assert!(watchdog.since_last_beat() < Duration::from_millis(50));
        assert!(!watchdog.is_expired());
    }
}
