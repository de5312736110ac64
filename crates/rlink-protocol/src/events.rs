//! 链路事件掩码

use bitflags::bitflags;

bitflags! {
    /// 链路通知事件
    ///
    /// 既用于注册事件通知（订阅哪些事件），也作为 `status()` 的返回值
    /// （哪些事件触发了本次通知）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LinkEvents: u32 {
        /// 链路断开
        const DISCONNECTED = 0x01;
        /// 链路错误
        const ERROR = 0x02;
        /// 有新的遥测数据
        const DATA_READY = 0x04;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bits_match_device_values() {
        assert_eq!(LinkEvents::DISCONNECTED.bits(), 0x01);
        assert_eq!(LinkEvents::ERROR.bits(), 0x02);
        assert_eq!(LinkEvents::DATA_READY.bits(), 0x04);
    }
}
