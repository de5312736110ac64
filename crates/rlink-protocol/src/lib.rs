//! # rlink Protocol
//!
//! rlink 轮椅设备的纯数据模型（无硬件依赖）
//!
//! ## 模块
//!
//! - `types`: 灯光、按键、轴、状态等枚举
//! - `events`: 链路事件掩码
//! - `command`: 下行命令状态（`OutgoingCommand`）
//! - `telemetry`: 上行遥测状态（`IncomingTelemetry`）及其可读转储
//!
//! 所有结构体都是 `Copy` 的纯数据，便于在共享状态容器中整体快照。

pub mod command;
pub mod events;
pub mod telemetry;
pub mod types;

pub use command::*;
pub use events::LinkEvents;
pub use telemetry::*;
pub use types::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 原始值超出枚举范围
    #[error("Invalid {kind} value: {value}")]
    InvalidValue { kind: &'static str, value: u8 },
}
