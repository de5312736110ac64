//! Mock 链路（仅测试 / `mock` feature）
//!
//! 按顺序记录每一次调用，可注入 getter/setter 故障，可手动触发事件。

use crate::error::LinkError;
use crate::link::{EventNotifier, Link};
use parking_lot::Mutex;
use rlink_protocol::{
    AxisDirection, AxisId, BatteryInfo, Button, ErrorCodes, IncomingTelemetry, Light, LightState,
    LinkEvents, LinkFault, Mode, ProcessSelection, Profile, SpeedInfo, StatusInfo, Velocity,
};
use std::collections::HashMap;

/// 上行 getter 标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Getter {
    Mode,
    Profile,
    Horn,
    Battery,
    Velocity,
    Speed,
    Light(Light),
    ProcessSelection,
    DeviceStatus,
    ErrorCodes,
    LatestError,
}

/// 一次链路调用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCall {
    Open,
    Close,
    SetXy { x: i8, y: i8 },
    SetAxis { axis: AxisId, direction: AxisDirection },
    SetButton { button: Button, pressed: bool },
    SetHorn(bool),
    SetLight { light: Light, on: bool },
    SetError(u8),
    Heartbeat,
    Get(Getter),
    Status,
}

impl LinkCall {
    /// 是否为下行 setter（不含心跳）
    pub fn is_setter(&self) -> bool {
        matches!(
            self,
            LinkCall::SetXy { .. }
                | LinkCall::SetAxis { .. }
                | LinkCall::SetButton { .. }
                | LinkCall::SetHorn(_)
                | LinkCall::SetLight { .. }
                | LinkCall::SetError(_)
        )
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<LinkCall>,
    telemetry: IncomingTelemetry,
    latest_error: LinkFault,
    failing_getters: HashMap<Getter, LinkError>,
    setter_failure: Option<LinkError>,
    heartbeat_failure: Option<LinkError>,
    status_failure: Option<LinkError>,
    mask: LinkEvents,
    notifier: Option<EventNotifier>,
    pending: LinkEvents,
}

/// 记录调用的 Mock 链路
#[derive(Default)]
pub struct MockLink {
    state: Mutex<MockState>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 getter 返回的遥测
    pub fn set_telemetry(&self, telemetry: IncomingTelemetry) {
        self.state.lock().telemetry = telemetry;
    }

    /// 设置 `latest_error()` 的返回值
    pub fn set_latest_error(&self, fault: LinkFault) {
        self.state.lock().latest_error = fault;
    }

    /// 让某个 getter 返回错误
    pub fn fail_getter(&self, getter: Getter, err: LinkError) {
        self.state.lock().failing_getters.insert(getter, err);
    }

    /// 恢复某个 getter
    pub fn heal_getter(&self, getter: Getter) {
        self.state.lock().failing_getters.remove(&getter);
    }

    /// 让全部下行 setter 返回错误（`None` 恢复）
    pub fn fail_setters(&self, err: Option<LinkError>) {
        self.state.lock().setter_failure = err;
    }

    /// 让心跳返回错误（`None` 恢复）
    pub fn fail_heartbeat(&self, err: Option<LinkError>) {
        self.state.lock().heartbeat_failure = err;
    }

    /// 让 `status()` 返回错误（`None` 恢复）
    pub fn fail_status(&self, err: Option<LinkError>) {
        self.state.lock().status_failure = err;
    }

    /// 触发事件：按注册掩码过滤、记入待查询集合并调用回调
    ///
    /// 返回是否调用了回调。
    pub fn fire(&self, events: LinkEvents) -> bool {
        let notifier = {
            let mut state = self.state.lock();
            let masked = events & state.mask;
            if masked.is_empty() {
                return false;
            }
            state.pending |= masked;
            state.notifier.clone()
        };

        match notifier {
            Some(notify) => {
                notify();
                true
            },
            None => false,
        }
    }

    /// 是否已注册回调
    pub fn is_registered(&self) -> bool {
        self.state.lock().notifier.is_some()
    }

    /// 当前注册的事件掩码
    pub fn registered_events(&self) -> LinkEvents {
        self.state.lock().mask
    }

    /// 全部调用记录（副本）
    pub fn calls(&self) -> Vec<LinkCall> {
        self.state.lock().calls.clone()
    }

    /// 取出并清空调用记录
    pub fn take_calls(&self) -> Vec<LinkCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// 仅下行 setter 调用
    pub fn setter_calls(&self) -> Vec<LinkCall> {
        self.state
            .lock()
            .calls
            .iter()
            .copied()
            .filter(LinkCall::is_setter)
            .collect()
    }

    /// 某类调用出现的次数
    pub fn count(&self, call: LinkCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    fn record_setter(&self, call: LinkCall) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.setter_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn get<T>(
        &self,
        getter: Getter,
        read: impl FnOnce(&MockState) -> T,
    ) -> Result<T, LinkError> {
        let mut state = self.state.lock();
        state.calls.push(LinkCall::Get(getter));
        if let Some(err) = state.failing_getters.get(&getter) {
            return Err(*err);
        }
        Ok(read(&state))
    }
}

impl Link for MockLink {
    fn open(&self) -> Result<(), LinkError> {
        self.state.lock().calls.push(LinkCall::Open);
        Ok(())
    }

    fn close(&self) -> Result<(), LinkError> {
        self.state.lock().calls.push(LinkCall::Close);
        Ok(())
    }

    fn set_xy(&self, x: i8, y: i8) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetXy { x, y })
    }

    fn set_axis(&self, axis: AxisId, direction: AxisDirection) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetAxis { axis, direction })
    }

    fn set_button(&self, button: Button, pressed: bool) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetButton { button, pressed })
    }

    fn set_horn(&self, on: bool) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetHorn(on))
    }

    fn set_light(&self, light: Light, on: bool) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetLight { light, on })
    }

    fn set_error(&self, code: u8) -> Result<(), LinkError> {
        self.record_setter(LinkCall::SetError(code))
    }

    fn heartbeat(&self) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        state.calls.push(LinkCall::Heartbeat);
        match state.heartbeat_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mode(&self) -> Result<Mode, LinkError> {
        self.get(Getter::Mode, |s| s.telemetry.hms.mode)
    }

    fn profile(&self) -> Result<Profile, LinkError> {
        self.get(Getter::Profile, |s| s.telemetry.hms.profile)
    }

    fn horn(&self) -> Result<bool, LinkError> {
        self.get(Getter::Horn, |s| s.telemetry.horn)
    }

    fn battery(&self) -> Result<BatteryInfo, LinkError> {
        self.get(Getter::Battery, |s| s.telemetry.battery)
    }

    fn velocity(&self) -> Result<Velocity, LinkError> {
        self.get(Getter::Velocity, |s| s.telemetry.velocity)
    }

    fn speed(&self) -> Result<SpeedInfo, LinkError> {
        self.get(Getter::Speed, |s| s.telemetry.speed)
    }

    fn light(&self, light: Light) -> Result<LightState, LinkError> {
        self.get(Getter::Light(light), |s| s.telemetry.light(light))
    }

    fn process_selection(&self) -> Result<ProcessSelection, LinkError> {
        self.get(Getter::ProcessSelection, |s| s.telemetry.hms.processes)
    }

    fn device_status(&self) -> Result<StatusInfo, LinkError> {
        self.get(Getter::DeviceStatus, |s| s.telemetry.status)
    }

    fn error_codes(&self) -> Result<ErrorCodes, LinkError> {
        self.get(Getter::ErrorCodes, |s| s.telemetry.errors)
    }

    fn latest_error(&self) -> Result<LinkFault, LinkError> {
        self.get(Getter::LatestError, |s| s.latest_error)
    }

    fn set_event_notification(
        &self,
        events: LinkEvents,
        notifier: Option<EventNotifier>,
    ) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        state.mask = if notifier.is_some() {
            events
        } else {
            LinkEvents::empty()
        };
        state.notifier = notifier;
        state.pending = LinkEvents::empty();
        Ok(())
    }

    fn status(&self) -> Result<LinkEvents, LinkError> {
        let mut state = self.state.lock();
        state.calls.push(LinkCall::Status);
        if let Some(err) = state.status_failure {
            return Err(err);
        }
        Ok(std::mem::take(&mut state.pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_records_calls_in_order() {
        let link = MockLink::new();
        link.heartbeat().unwrap();
        link.set_xy(20, 0).unwrap();
        link.set_horn(true).unwrap();

        assert_eq!(
            link.calls(),
            vec![
                LinkCall::Heartbeat,
                LinkCall::SetXy { x: 20, y: 0 },
                LinkCall::SetHorn(true)
            ]
        );
        assert_eq!(link.setter_calls().len(), 2);
    }

    #[test]
    fn test_failing_getter_still_recorded() {
        let link = MockLink::new();
        link.fail_getter(Getter::Battery, LinkError::Timeout);

        assert_eq!(link.battery(), Err(LinkError::Timeout));
        assert_eq!(link.calls(), vec![LinkCall::Get(Getter::Battery)]);

        link.heal_getter(Getter::Battery);
        assert!(link.battery().is_ok());
    }

    #[test]
    fn test_fire_respects_mask() {
        let link = MockLink::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        link.set_event_notification(
            LinkEvents::DATA_READY,
            Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

        assert!(!link.fire(LinkEvents::DISCONNECTED));
        assert!(link.fire(LinkEvents::DATA_READY | LinkEvents::ERROR));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert_eq!(link.status().unwrap(), LinkEvents::DATA_READY);
        assert_eq!(link.status().unwrap(), LinkEvents::empty());
    }

    #[test]
    fn test_unregister_clears_mask() {
        let link = MockLink::new();
        link.set_event_notification(LinkEvents::all(), Some(Arc::new(|| {})))
            .unwrap();
        assert!(link.is_registered());

        link.set_event_notification(LinkEvents::all(), None).unwrap();
        assert!(!link.is_registered());
        assert!(!link.fire(LinkEvents::DATA_READY));
    }
}
