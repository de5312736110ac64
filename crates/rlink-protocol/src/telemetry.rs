//! 上行遥测状态
//!
//! 主线程在收到 DATA_READY 后逐项拉取并整体发布；各子项独立刷新，
//! 同一快照内的子项可能来自不同的采样时刻。

use crate::types::{DeviceStatus, Light, Mode, Profile};
use std::fmt;

/// 设备状态信息
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusInfo {
    /// 摇杆是否离开中位（out of neutral）
    pub out_of_neutral: bool,
    pub status: DeviceStatus,
    pub warning: u8,
}

/// 主机模式选择中的进程掩码部分（对应设备的 hms 查询）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessSelection {
    pub input_process: u16,
    pub inter_process: u16,
    pub output_process: u16,
    pub sel_input: bool,
    pub sel_inter: bool,
    pub sel_output: bool,
}

/// 主机模式选择（模式、配置档、进程掩码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostModeSelection {
    pub mode: Mode,
    pub profile: Profile,
    pub processes: ProcessSelection,
}

/// 电池信息
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryInfo {
    pub low: bool,
    /// 电量表（0-100）
    pub gauge: u8,
    /// 电流（A）
    pub current: f32,
}

/// 电机速度（rad/s）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    pub m1: f32,
    pub m2: f32,
    pub turn: f32,
}

/// 速度信息
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedInfo {
    /// 档位速度
    pub speed: u8,
    /// 实际速度（m/s）
    pub true_speed: f32,
    /// 是否施加了限速（设备原样返回的字节）
    pub limit_applied: u8,
}

/// 单个灯的反馈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightState {
    pub active: bool,
    pub lit: bool,
}

/// 设备错误码（接口侧 / R-net 侧）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorCodes {
    pub interface: u16,
    pub rnet: u16,
}

/// 上行遥测（整体快照）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncomingTelemetry {
    pub status: StatusInfo,
    pub hms: HostModeSelection,
    pub horn: bool,
    pub battery: BatteryInfo,
    pub velocity: Velocity,
    pub speed: SpeedInfo,
    pub lights: [LightState; Light::COUNT],
    pub errors: ErrorCodes,
}

impl IncomingTelemetry {
    /// 某个灯的反馈
    pub fn light(&self, light: Light) -> LightState {
        self.lights[light.index()]
    }

    /// 实际速度（km/h）
    pub fn true_speed_kmh(&self) -> f32 {
        self.speed.true_speed * 3.6
    }
}

fn flag(value: bool) -> u8 {
    value as u8
}

/// 控制台 `dump` 动作的输出格式
impl fmt::Display for IncomingTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Status")?;
        writeln!(f, " - oon:               {}", flag(self.status.out_of_neutral))?;
        writeln!(f, " - status:            {}", self.status.status.label())?;
        writeln!(f, " - warning:           {:02x}", self.status.warning)?;

        writeln!(f)?;
        writeln!(f, "Battery")?;
        writeln!(f, " - low:               {}", flag(self.battery.low))?;
        writeln!(f, " - gauge:             {}", self.battery.gauge)?;
        writeln!(f, " - current:           {:.2} A", self.battery.current)?;

        let p = &self.hms.processes;
        writeln!(f)?;
        writeln!(f, "Host modal selection")?;
        writeln!(f, " - mode:              {}", u8::from(self.hms.mode))?;
        writeln!(f, " - profile:           {}", u8::from(self.hms.profile))?;
        writeln!(f, " - inputProcess:      {:04x}", p.input_process)?;
        writeln!(f, " - interProcess:      {:04x}", p.inter_process)?;
        writeln!(f, " - outputProcess:     {:04x}", p.output_process)?;
        writeln!(f, " - selInput:          {}", flag(p.sel_input))?;
        writeln!(f, " - selInter:          {}", flag(p.sel_inter))?;
        writeln!(f, " - selOutput:         {}", flag(p.sel_output))?;

        writeln!(f)?;
        writeln!(f, "Horn")?;
        writeln!(f, " - horn:              {}", flag(self.horn))?;

        writeln!(f)?;
        writeln!(f, "Velocity")?;
        writeln!(f, " - m1Vel:             {:.2} rad/s", self.velocity.m1)?;
        writeln!(f, " - m2Vel:             {:.2} rad/s", self.velocity.m2)?;
        writeln!(f, " - turnVel:           {:.2} rad/s", self.velocity.turn)?;

        writeln!(f)?;
        writeln!(f, "Speed")?;
        writeln!(f, " - speed:             {}", self.speed.speed)?;
        writeln!(f, " - trueSpeed:         {:.2} km/h", self.true_speed_kmh())?;
        writeln!(f, " - speedLimitApplied: {}", self.speed.limit_applied)?;

        writeln!(f)?;
        writeln!(f, "Errors")?;
        writeln!(f, " - interface:         {:04x}", self.errors.interface)?;
        writeln!(f, " - rnet:              {:04x}", self.errors.rnet)?;

        for light in Light::ALL {
            let state = self.light(light);
            writeln!(f)?;
            writeln!(f, "Light {}", light.name())?;
            writeln!(f, " - active:            {}", flag(state.active))?;
            writeln!(f, " - lit:               {}", flag(state.lit))?;
        }
        Ok(())
    }
}
