//! 下行命令状态
//!
//! 控制台线程修改、桥接线程周期读取并与上次发送值做差分。

use crate::types::{AxisDirection, Light};

/// 位置分量单步变化量
pub const POSITION_STEP: i8 = 20;

/// 位置分量绝对值上限
pub const POSITION_LIMIT: i8 = 100;

/// 下行命令（整体快照读写）
///
/// `Default` 即设备上电后的中立状态：位置归零、按键松开、灯光和喇叭关闭、
/// 轴静止、无错误码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutgoingCommand {
    /// 水平位置 [-100, 100]
    pub x: i8,
    /// 垂直位置 [-100, 100]
    pub y: i8,
    /// 按键（黄色按键头）是否按下
    pub button: bool,
    /// 灯光开关，按 `Light::index()` 索引
    pub lights: [bool; Light::COUNT],
    /// 喇叭
    pub horn: bool,
    /// 0 号轴运动方向
    pub axis: AxisDirection,
    /// 错误码（0 表示无错误）
    pub error: u8,
}

impl OutgoingCommand {
    /// 读取某个灯的开关
    pub fn light(&self, light: Light) -> bool {
        self.lights[light.index()]
    }

    /// 翻转某个灯的开关
    pub fn toggle_light(&mut self, light: Light) {
        let slot = &mut self.lights[light.index()];
        *slot = !*slot;
    }

    /// 向上一步，已达上限时不变
    pub fn step_up(&mut self) {
        self.y = step_towards_limit(self.y, POSITION_STEP);
    }

    /// 向下一步，已达下限时不变
    pub fn step_down(&mut self) {
        self.y = step_towards_limit(self.y, -POSITION_STEP);
    }

    /// 向左一步
    pub fn step_left(&mut self) {
        self.x = step_towards_limit(self.x, -POSITION_STEP);
    }

    /// 向右一步
    pub fn step_right(&mut self) {
        self.x = step_towards_limit(self.x, POSITION_STEP);
    }

    /// 位置回中
    pub fn neutral(&mut self) {
        self.x = 0;
        self.y = 0;
    }
}

/// 仅当当前值严格位于界内时才移动一步
fn step_towards_limit(value: i8, step: i8) -> i8 {
    if step > 0 && value < POSITION_LIMIT {
        value.saturating_add(step).min(POSITION_LIMIT)
    } else if step < 0 && value > -POSITION_LIMIT {
        value.saturating_add(step).max(-POSITION_LIMIT)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let cmd = OutgoingCommand::default();
        assert_eq!(cmd.x, 0);
        assert_eq!(cmd.y, 0);
        assert!(!cmd.button);
        assert!(!cmd.horn);
        assert!(cmd.lights.iter().all(|&on| !on));
        assert_eq!(cmd.axis, AxisDirection::None);
        assert_eq!(cmd.error, 0);
    }

    #[test]
    fn test_steps_are_bounded() {
        let mut cmd = OutgoingCommand::default();
        for _ in 0..10 {
            cmd.step_up();
        }
        assert_eq!(cmd.y, 100);
        for _ in 0..20 {
            cmd.step_down();
        }
        assert_eq!(cmd.y, -100);
        for _ in 0..10 {
            cmd.step_left();
        }
        assert_eq!(cmd.x, -100);
        for _ in 0..10 {
            cmd.step_right();
        }
        assert_eq!(cmd.x, 100);
    }

    #[test]
    fn test_neutral_resets_position_only() {
        let mut cmd = OutgoingCommand {
            x: 60,
            y: -40,
            horn: true,
            ..Default::default()
        };
        cmd.neutral();
        assert_eq!((cmd.x, cmd.y), (0, 0));
        assert!(cmd.horn);
    }

    #[test]
    fn test_toggle_light_is_independent() {
        let mut cmd = OutgoingCommand::default();
        cmd.toggle_light(Light::Hazard);
        assert!(cmd.light(Light::Hazard));
        assert!(!cmd.light(Light::Brake));
        cmd.toggle_light(Light::Hazard);
        assert!(!cmd.light(Light::Hazard));
    }

    #[test]
    fn test_off_grid_values_stay_in_range() {
        // 外部写入的非步进值也不会越界
        let mut cmd = OutgoingCommand {
            x: 95,
            y: -95,
            ..Default::default()
        };
        cmd.step_right();
        cmd.step_down();
        assert_eq!(cmd.x, 100);
        assert_eq!(cmd.y, -100);
    }
}
