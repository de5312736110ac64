//! 会话配置

use crate::error::SessionError;
use std::time::Duration;

/// 会话配置
///
/// 默认值与设备参考控制台一致：桥接线程 40 ms 轮询、控制台 10 ms 轮询、
/// 心跳默认开启、输入行最长 256 个字符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// 桥接线程轮询周期（下发差分 + 心跳）
    pub command_poll: Duration,
    /// 控制台线程轮询周期（读取输入）
    pub console_poll: Duration,
    /// 会话开始时心跳是否开启
    pub heartbeat_on_start: bool,
    /// 等待工作线程启动的上限
    pub startup_timeout: Duration,
    /// 等待工作线程退出的上限
    pub shutdown_timeout: Duration,
    /// 输入行缓冲长度（字符）
    pub line_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_poll: Duration::from_millis(40),
            console_poll: Duration::from_millis(10),
            heartbeat_on_start: true,
            startup_timeout: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(2),
            line_limit: 256,
        }
    }
}

impl SessionConfig {
    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), SessionError> {
        let intervals = [
            ("command_poll", self.command_poll),
            ("console_poll", self.console_poll),
            ("startup_timeout", self.startup_timeout),
            ("shutdown_timeout", self.shutdown_timeout),
        ];
        for (name, value) in intervals {
            if value.is_zero() {
                return Err(SessionError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.line_limit == 0 {
            return Err(SessionError::InvalidConfig(
                "line_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
