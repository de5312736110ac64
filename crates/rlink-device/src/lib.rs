//! # rlink Device
//!
//! 设备链路能力层：会话核心依赖的 `Link` trait、链路错误码，以及一个不需要
//! 硬件的模拟设备实现。
//!
//! ## 模块
//!
//! - `link`: `Link` trait 与事件通知回调类型
//! - `error`: `LinkError`（与设备状态码一一对应）
//! - `sim`: `SimulatedLink`（后台线程周期性发出 DATA_READY，模拟心跳超时）
//! - `watchdog`: 设备端心跳看门狗
//! - `mock`: 记录调用的 `MockLink`（`mock` feature）

pub mod error;
pub mod link;
pub mod sim;
pub mod watchdog;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::LinkError;
pub use link::{EventNotifier, Link};
pub use sim::{SimConfig, SimulatedLink};
pub use watchdog::HeartbeatWatchdog;

#[cfg(any(test, feature = "mock"))]
pub use mock::{Getter, LinkCall, MockLink};
