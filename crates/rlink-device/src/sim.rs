//! 模拟设备
//!
//! 没有真实硬件时的链路实现：记住下行命令，从命令推导遥测，
//! 周期性发出 DATA_READY 通知，并在设备端模拟心跳超时。
//!
//! # 线程模型
//!
//! `open()` 启动一个事件线程（`rlink-sim`），`close()` 或 Drop 时停止并 join。
//! 通知回调总是在释放内部锁之后调用。

use crate::error::LinkError;
use crate::link::{EventNotifier, Link};
use crate::watchdog::HeartbeatWatchdog;
use parking_lot::{Condvar, Mutex};
use rlink_protocol::{
    AxisDirection, AxisId, BatteryInfo, Button, DeviceStatus, ErrorCodes, Light, LightState,
    LinkEvents, LinkFault, Mode, ProcessSelection, Profile, SpeedInfo, StatusInfo, Velocity,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// 模拟设备配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// DATA_READY 通知周期
    pub data_period: Duration,
    /// 设备端心跳超时（`None` 表示不检查）
    pub heartbeat_timeout: Option<Duration>,
    /// 打开后经过该时间发出 DISCONNECTED（`None` 表示不断开）
    pub disconnect_after: Option<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_period: Duration::from_millis(100),
            heartbeat_timeout: Some(Duration::from_secs(1)),
            disconnect_after: None,
        }
    }
}

/// 满速时的实际速度（m/s）
const MAX_TRUE_SPEED: f32 = 1.7;
/// 满偏时的电机角速度（rad/s）
const MAX_MOTOR_VEL: f32 = 3.0;

/// 设备内部模型
#[derive(Debug)]
struct DeviceModel {
    x: i8,
    y: i8,
    buttons: [bool; 3],
    horn: bool,
    lights: [bool; Light::COUNT],
    axes: [AxisDirection; AxisId::COUNT as usize],
    error: u8,
    gauge: f32,
    fault: LinkFault,
}

impl Default for DeviceModel {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            buttons: [false; 3],
            horn: false,
            lights: [false; Light::COUNT],
            axes: [AxisDirection::None; AxisId::COUNT as usize],
            error: 0,
            gauge: 100.0,
            fault: LinkFault::None,
        }
    }
}

impl DeviceModel {
    /// 推进一个通知周期（电量随负载下降）
    fn advance(&mut self) {
        let load = 1.0 + f32::from(self.y.unsigned_abs()) / 100.0;
        self.gauge = (self.gauge - 0.01 * load).max(0.0);
    }

    fn deflection(&self) -> (f32, f32) {
        (f32::from(self.x) / 100.0, f32::from(self.y) / 100.0)
    }
}

/// 事件注册状态
#[derive(Default)]
struct Registration {
    mask: LinkEvents,
    notifier: Option<EventNotifier>,
    pending: LinkEvents,
}

struct SimShared {
    config: SimConfig,
    model: Mutex<DeviceModel>,
    registration: Mutex<Registration>,
    is_open: AtomicBool,
    stop: Mutex<bool>,
    stop_cv: Condvar,
    watchdog: HeartbeatWatchdog,
}

impl SimShared {
    /// 记录事件并通知（回调在锁外调用）
    fn post(&self, events: LinkEvents) {
        let notifier = {
            let mut registration = self.registration.lock();
            let masked = events & registration.mask;
            if masked.is_empty() {
                return;
            }
            registration.pending |= masked;
            registration.notifier.clone()
        };

        if let Some(notify) = notifier {
            notify();
        }
    }
}

/// 模拟 rlink 设备
pub struct SimulatedLink {
    shared: Arc<SimShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedLink {
    /// 创建模拟设备（未打开）
    pub fn new(config: SimConfig) -> Self {
        let timeout = config.heartbeat_timeout.unwrap_or(Duration::MAX);
        Self {
            shared: Arc::new(SimShared {
                config,
                model: Mutex::new(DeviceModel::default()),
                registration: Mutex::new(Registration::default()),
                is_open: AtomicBool::new(false),
                stop: Mutex::new(false),
                stop_cv: Condvar::new(),
                watchdog: HeartbeatWatchdog::new(timeout),
            }),
            worker: Mutex::new(None),
        }
    }

    /// 当前配置
    pub fn config(&self) -> &SimConfig {
        &self.shared.config
    }

    /// 是否已打开
    pub fn is_open(&self) -> bool {
        self.shared.is_open.load(Ordering::Acquire)
    }

    /// 主动注入事件（例如模拟拔线）
    pub fn inject(&self, events: LinkEvents) {
        self.shared.post(events);
    }

    fn ensure_open(&self) -> Result<(), LinkError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(LinkError::NotOpen)
        }
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// 模拟设备事件线程
fn event_loop(shared: Arc<SimShared>) {
    let opened_at = Instant::now();
    let period = shared.config.data_period;
    let mut timed_out = false;
    let mut disconnected = false;

    loop {
        {
            let mut stop = shared.stop.lock();
            if !*stop {
                shared.stop_cv.wait_for(&mut stop, period);
            }
            if *stop {
                break;
            }
        }

        let mut events = LinkEvents::DATA_READY;

        {
            let mut model = shared.model.lock();
            model.advance();

            if shared.config.heartbeat_timeout.is_some()
                && !timed_out
                && shared.watchdog.is_expired()
            {
                timed_out = true;
                model.fault = LinkFault::Timeout;
                warn!(
                    "Sim: no heartbeat for {:?}, raising link error",
                    shared.watchdog.since_last_beat()
                );
                events |= LinkEvents::ERROR;
            }
        }

        if let Some(after) = shared.config.disconnect_after {
            if !disconnected && opened_at.elapsed() >= after {
                disconnected = true;
                info!("Sim: scripted disconnect after {:?}", after);
                events |= LinkEvents::DISCONNECTED;
            }
        }

        trace!("Sim: posting {:?}", events);
        shared.post(events);
    }

    trace!("Sim: event loop exited");
}

impl Link for SimulatedLink {
    fn open(&self) -> Result<(), LinkError> {
        if self.shared.is_open.swap(true, Ordering::AcqRel) {
            return Err(LinkError::Busy);
        }

        *self.shared.stop.lock() = false;
        *self.shared.model.lock() = DeviceModel::default();
        self.shared.watchdog.feed();

        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("rlink-sim".into())
            .spawn(move || event_loop(shared))
            .map_err(|e| {
                warn!("Sim: failed to spawn event thread: {}", e);
                self.shared.is_open.store(false, Ordering::Release);
                LinkError::Driver
            })?;
        *self.worker.lock() = Some(handle);

        info!("Sim: link opened");
        Ok(())
    }

    fn close(&self) -> Result<(), LinkError> {
        if !self.shared.is_open.swap(false, Ordering::AcqRel) {
            return Err(LinkError::NotOpen);
        }

        {
            let mut stop = self.shared.stop.lock();
            *stop = true;
            self.shared.stop_cv.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Sim: event thread panicked");
            }
        }

        info!("Sim: link closed");
        Ok(())
    }

    fn set_xy(&self, x: i8, y: i8) -> Result<(), LinkError> {
        self.ensure_open()?;
        let mut model = self.shared.model.lock();
        model.x = x;
        model.y = y;
        debug!("Sim: xy = ({}, {})", x, y);
        Ok(())
    }

    fn set_axis(&self, axis: AxisId, direction: AxisDirection) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.model.lock().axes[usize::from(axis.get())] = direction;
        Ok(())
    }

    fn set_button(&self, button: Button, pressed: bool) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.model.lock().buttons[usize::from(u8::from(button))] = pressed;
        Ok(())
    }

    fn set_horn(&self, on: bool) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.model.lock().horn = on;
        Ok(())
    }

    fn set_light(&self, light: Light, on: bool) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.model.lock().lights[light.index()] = on;
        Ok(())
    }

    fn set_error(&self, code: u8) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.model.lock().error = code;
        Ok(())
    }

    fn heartbeat(&self) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.shared.watchdog.feed();
        Ok(())
    }

    fn mode(&self) -> Result<Mode, LinkError> {
        self.ensure_open()?;
        Ok(Mode::Mode1)
    }

    fn profile(&self) -> Result<Profile, LinkError> {
        self.ensure_open()?;
        Ok(Profile::Profile1)
    }

    fn horn(&self) -> Result<bool, LinkError> {
        self.ensure_open()?;
        Ok(self.shared.model.lock().horn)
    }

    fn battery(&self) -> Result<BatteryInfo, LinkError> {
        self.ensure_open()?;
        let model = self.shared.model.lock();
        let (x, y) = model.deflection();
        Ok(BatteryInfo {
            low: model.gauge < 20.0,
            gauge: model.gauge.round() as u8,
            current: 0.5 + (x.abs() + y.abs()) * 6.0,
        })
    }

    fn velocity(&self) -> Result<Velocity, LinkError> {
        self.ensure_open()?;
        let (x, y) = self.shared.model.lock().deflection();
        Ok(Velocity {
            m1: (y + x) * MAX_MOTOR_VEL,
            m2: (y - x) * MAX_MOTOR_VEL,
            turn: x * MAX_MOTOR_VEL / 2.0,
        })
    }

    fn speed(&self) -> Result<SpeedInfo, LinkError> {
        self.ensure_open()?;
        let (_, y) = self.shared.model.lock().deflection();
        Ok(SpeedInfo {
            speed: 3,
            true_speed: y.abs() * MAX_TRUE_SPEED,
            limit_applied: 0,
        })
    }

    fn light(&self, light: Light) -> Result<LightState, LinkError> {
        self.ensure_open()?;
        let on = self.shared.model.lock().lights[light.index()];
        Ok(LightState {
            active: on,
            lit: on,
        })
    }

    fn process_selection(&self) -> Result<ProcessSelection, LinkError> {
        self.ensure_open()?;
        Ok(ProcessSelection {
            input_process: 0x0001,
            inter_process: 0x0001,
            output_process: 0x0001,
            sel_input: true,
            sel_inter: true,
            sel_output: true,
        })
    }

    fn device_status(&self) -> Result<StatusInfo, LinkError> {
        self.ensure_open()?;
        let model = self.shared.model.lock();
        let status = if model.error != 0 || model.fault != LinkFault::None {
            DeviceStatus::Error
        } else {
            DeviceStatus::Focus
        };
        Ok(StatusInfo {
            out_of_neutral: model.x != 0 || model.y != 0,
            status,
            warning: model.error,
        })
    }

    fn error_codes(&self) -> Result<ErrorCodes, LinkError> {
        self.ensure_open()?;
        let model = self.shared.model.lock();
        Ok(ErrorCodes {
            interface: u16::from(model.error),
            rnet: 0,
        })
    }

    fn latest_error(&self) -> Result<LinkFault, LinkError> {
        self.ensure_open()?;
        Ok(self.shared.model.lock().fault)
    }

    fn set_event_notification(
        &self,
        events: LinkEvents,
        notifier: Option<EventNotifier>,
    ) -> Result<(), LinkError> {
        let mut registration = self.shared.registration.lock();
        registration.mask = if notifier.is_some() {
            events
        } else {
            LinkEvents::empty()
        };
        registration.notifier = notifier;
        registration.pending = LinkEvents::empty();
        Ok(())
    }

    fn status(&self) -> Result<LinkEvents, LinkError> {
        Ok(std::mem::take(&mut self.shared.registration.lock().pending))
    }
}

impl Drop for SimulatedLink {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}
