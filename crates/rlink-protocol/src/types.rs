//! 设备枚举定义
//!
//! 与 rlink 设备接口中的枚举一一对应，原始值为 `u8`。

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 灯光标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Light {
    /// 刹车灯
    Brake = 0,
    /// 近光灯
    Dip = 1,
    /// 危险警示灯
    Hazard = 2,
    /// 左转向灯
    Left = 3,
    /// 右转向灯
    Right = 4,
}

impl Light {
    /// 灯光数量
    pub const COUNT: usize = 5;

    /// 按索引顺序排列的全部灯光
    pub const ALL: [Light; Light::COUNT] = [
        Light::Brake,
        Light::Dip,
        Light::Hazard,
        Light::Left,
        Light::Right,
    ];

    /// 数组索引
    pub fn index(self) -> usize {
        self as usize
    }

    /// 可读名称（用于转储和菜单）
    pub fn name(self) -> &'static str {
        match self {
            Light::Brake => "brake",
            Light::Dip => "dip",
            Light::Hazard => "hazard",
            Light::Left => "left",
            Light::Right => "right",
        }
    }
}

/// 按键标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Button {
    /// 黄色按键头
    YellowTip = 0,
    /// 黄色环
    YellowRing = 1,
    /// 红色环
    RedRing = 2,
}

/// 轴标识（0-31）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisId(u8);

impl AxisId {
    /// 轴数量
    pub const COUNT: u8 = 32;

    /// 0 号轴（控制台驱动的唯一一根轴）
    pub const AXIS_0: AxisId = AxisId(0);

    /// 创建轴标识
    ///
    /// # 错误
    /// - `ProtocolError::InvalidValue`: `id >= 32`
    pub fn new(id: u8) -> Result<Self, ProtocolError> {
        if id < Self::COUNT {
            Ok(Self(id))
        } else {
            Err(ProtocolError::InvalidValue {
                kind: "axis id",
                value: id,
            })
        }
    }

    /// 原始值
    pub fn get(self) -> u8 {
        self.0
    }
}

/// 轴运动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AxisDirection {
    /// 不运动
    None = 0,
    /// 向上
    Up = 1,
    /// 向下
    Down = 2,
}

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeviceStatus {
    Configuring = 0,
    Error = 1,
    PowerCycle = 2,
    Shutdown = 3,
    OutOfFocus = 4,
    Focus = 5,
}

impl DeviceStatus {
    /// 转储使用的大写名称
    pub fn label(self) -> &'static str {
        match self {
            DeviceStatus::Configuring => "CONFIGURING",
            DeviceStatus::Error => "ERROR",
            DeviceStatus::PowerCycle => "POWER_CYCLE",
            DeviceStatus::Shutdown => "SHUTDOWN",
            DeviceStatus::OutOfFocus => "OUT_OF_FOCUS",
            DeviceStatus::Focus => "FOCUS",
        }
    }
}

/// 驾驶模式（原始值 0-7 对应 Mode 1-8）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Mode {
    Mode1 = 0,
    Mode2 = 1,
    Mode3 = 2,
    Mode4 = 3,
    Mode5 = 4,
    Mode6 = 5,
    Mode7 = 6,
    Mode8 = 7,
}

/// 用户配置档（原始值 0-7 对应 Profile 1-8）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Profile {
    Profile1 = 0,
    Profile2 = 1,
    Profile3 = 2,
    Profile4 = 3,
    Profile5 = 4,
    Profile6 = 5,
    Profile7 = 6,
    Profile8 = 7,
}

/// 链路最近一次错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LinkFault {
    /// 无错误
    None = 0,
    /// 超时（通常是心跳丢失）
    Timeout = 1,
    /// 内存不足
    OutOfMemory = 2,
    /// 主设备错误
    MasterDevice = 3,
}

// num_enum 会把 `#[default]` 变体当作未知值的兜底，这里手写 Default 保持 try_from 严格
#[allow(clippy::derivable_impls)]
impl Default for Button {
    fn default() -> Self {
        Button::YellowTip
    }
}

#[allow(clippy::derivable_impls)]
impl Default for AxisDirection {
    fn default() -> Self {
        AxisDirection::None
    }
}

#[allow(clippy::derivable_impls)]
impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus::Configuring
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Mode {
    fn default() -> Self {
        Mode::Mode1
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Profile {
    fn default() -> Self {
        Profile::Profile1
    }
}

#[allow(clippy::derivable_impls)]
impl Default for LinkFault {
    fn default() -> Self {
        LinkFault::None
    }
}
