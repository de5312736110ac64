//! 链路层错误类型定义

use thiserror::Error;

/// 链路层错误类型
///
/// 与设备库返回的状态码一一对应（状态码 0 表示成功，不在此列）。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// 底层 USB 驱动错误
    #[error("Driver error")]
    Driver,
    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
    #[error("Buffer overflow")]
    Overflow,
    #[error("Buffer underflow")]
    Underflow,
    #[error("Invalid arguments")]
    InvalidArgs,
    #[error("Not supported")]
    NotSupported,
    /// 未知错误（也用于无法识别的状态码）
    #[error("Unknown error")]
    Other,
    #[error("Out of memory")]
    NoMemory,
    #[error("Null pointer received")]
    NullPointer,
    #[error("Invalid size")]
    InvalidSize,
    #[error("Resource not found")]
    NotFound,
    #[error("Busy")]
    Busy,
    #[error("Message error")]
    Message,
    #[error("CRC error")]
    Crc,
    #[error("Invalid length")]
    InvalidLength,
    /// 链路未打开（会话外调用）
    #[error("Link not open")]
    NotOpen,
}

impl LinkError {
    /// 从设备状态码解析
    ///
    /// 返回 `None` 表示状态码为 0（成功）。
    pub fn from_status(code: u8) -> Option<Self> {
        let err = match code {
            0 => return None,
            1 => LinkError::Driver,
            2 => LinkError::Timeout,
            3 => LinkError::Overflow,
            4 => LinkError::Underflow,
            5 => LinkError::InvalidArgs,
            6 => LinkError::NotSupported,
            7 => LinkError::Other,
            8 => LinkError::NoMemory,
            9 => LinkError::NullPointer,
            10 => LinkError::InvalidSize,
            11 => LinkError::NotFound,
            12 => LinkError::Busy,
            13 => LinkError::Message,
            14 => LinkError::Crc,
            15 => LinkError::InvalidLength,
            _ => LinkError::Other,
        };
        Some(err)
    }

    /// 将设备状态码转换为 `Result`
    pub fn check(code: u8) -> Result<(), LinkError> {
        match Self::from_status(code) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
