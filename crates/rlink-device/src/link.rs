//! 链路能力接口
//!
//! 会话核心只通过 `Link` trait 与设备交互：逐字段的 setter/getter、心跳、
//! 事件通知注册和事件状态查询。

use crate::error::LinkError;
use rlink_protocol::{
    AxisDirection, AxisId, BatteryInfo, Button, ErrorCodes, Light, LightState,
    LinkEvents, LinkFault, Mode, ProcessSelection, Profile, SpeedInfo, StatusInfo, Velocity,
};
use std::sync::Arc;

/// 事件通知回调
///
/// 设备在订阅的事件发生时调用。实现方必须在**不持有自身内部锁**的情况下调用，
/// 因为回调通常会去获取会话主线程的信号锁，而主线程持有该锁期间会回调设备 getter。
pub type EventNotifier = Arc<dyn Fn() + Send + Sync>;

/// 设备链路
///
/// 所有方法都只需要 `&self`：实现方自行保证内部同步，以便桥接线程和主线程
/// 共享同一个句柄（`Arc<L>`）。
pub trait Link: Send + Sync {
    /// 打开会话
    fn open(&self) -> Result<(), LinkError>;
    /// 关闭会话
    fn close(&self) -> Result<(), LinkError>;

    // === 下行 setter ===
    fn set_xy(&self, x: i8, y: i8) -> Result<(), LinkError>;
    fn set_axis(&self, axis: AxisId, direction: AxisDirection) -> Result<(), LinkError>;
    fn set_button(&self, button: Button, pressed: bool) -> Result<(), LinkError>;
    fn set_horn(&self, on: bool) -> Result<(), LinkError>;
    fn set_light(&self, light: Light, on: bool) -> Result<(), LinkError>;
    fn set_error(&self, code: u8) -> Result<(), LinkError>;

    /// 心跳（重置设备端的超时计时器）
    fn heartbeat(&self) -> Result<(), LinkError>;

    // === 上行 getter ===
    fn mode(&self) -> Result<Mode, LinkError>;
    fn profile(&self) -> Result<Profile, LinkError>;
    fn horn(&self) -> Result<bool, LinkError>;
    fn battery(&self) -> Result<BatteryInfo, LinkError>;
    fn velocity(&self) -> Result<Velocity, LinkError>;
    fn speed(&self) -> Result<SpeedInfo, LinkError>;
    fn light(&self, light: Light) -> Result<LightState, LinkError>;
    fn process_selection(&self) -> Result<ProcessSelection, LinkError>;
    fn device_status(&self) -> Result<StatusInfo, LinkError>;
    fn error_codes(&self) -> Result<ErrorCodes, LinkError>;
    fn latest_error(&self) -> Result<LinkFault, LinkError>;

    /// 注册事件通知
    ///
    /// `notifier` 为 `None` 时取消注册。只有 `events` 中的事件会被记录和通知。
    fn set_event_notification(
        &self,
        events: LinkEvents,
        notifier: Option<EventNotifier>,
    ) -> Result<(), LinkError>;

    /// 查询触发本次通知的事件（读取后清除）
    ///
    /// 只应在通知回调所唤醒的线程中、持有对应信号锁时调用。
    fn status(&self) -> Result<LinkEvents, LinkError>;
}
