//! 会话层错误类型定义

use rlink_device::LinkError;
use thiserror::Error;

/// 会话层错误类型
///
/// 单个字段的收发失败不会走到这里：它们只记录日志和指标。
#[derive(Error, Debug)]
pub enum SessionError {
    /// 链路错误（注册事件通知失败等）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 创建工作线程失败
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 工作线程未在时限内启动
    #[error("Worker '{worker}' did not start in time")]
    StartupTimeout { worker: &'static str },

    /// 工作线程未在时限内退出（已分离）
    #[error("Worker '{worker}' did not stop in time")]
    ShutdownTimeout { worker: &'static str },

    /// 配置无效
    #[error("Invalid session config: {0}")]
    InvalidConfig(String),
}
