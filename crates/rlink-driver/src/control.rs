//! 各工作线程的请求类型

use crate::sync::{Request, SyncSignal};
use std::sync::Arc;
use tracing::info;

/// 投递给主线程（遥测 / 会话监督）的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainRequest {
    /// 用户退出（控制台 quit 或 Ctrl-C）
    UserQuit,
    /// 链路事件通知（DISCONNECTED / ERROR / DATA_READY）
    LinkEvent,
    /// 工作线程异常退出
    WorkerFault,
}

impl Request for MainRequest {
    fn bit(self) -> u32 {
        match self {
            MainRequest::UserQuit => 0x01,
            MainRequest::LinkEvent => 0x02,
            MainRequest::WorkerFault => 0x04,
        }
    }
}

/// 投递给桥接线程的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeRequest {
    Quit,
    /// 翻转心跳开关（两次未消费的翻转互相抵消）
    ToggleHeartbeat,
}

impl Request for BridgeRequest {
    fn bit(self) -> u32 {
        match self {
            BridgeRequest::Quit => 0x01,
            BridgeRequest::ToggleHeartbeat => 0x02,
        }
    }

    fn is_toggle(self) -> bool {
        self == BridgeRequest::ToggleHeartbeat
    }
}

/// 投递给控制台线程的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleRequest {
    Quit,
}

impl Request for ConsoleRequest {
    fn bit(self) -> u32 {
        match self {
            ConsoleRequest::Quit => 0x01,
        }
    }
}

/// 外部退出句柄（例如 Ctrl-C 处理函数）
#[derive(Debug, Clone)]
pub struct QuitHandle {
    main: Arc<SyncSignal<MainRequest>>,
}

impl QuitHandle {
    pub(crate) fn new(main: Arc<SyncSignal<MainRequest>>) -> Self {
        Self { main }
    }

    /// 请求结束会话
    pub fn quit(&self) {
        info!("Quit requested from outside the session");
        self.main.raise(MainRequest::UserQuit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_bits_are_distinct() {
        let main = [
            MainRequest::UserQuit,
            MainRequest::LinkEvent,
            MainRequest::WorkerFault,
        ];
        let combined = main.iter().fold(0u32, |acc, r| {
            assert_eq!(acc & r.bit(), 0, "{r:?} overlaps");
            acc | r.bit()
        });
        assert_eq!(combined.count_ones(), 3);
        assert_ne!(BridgeRequest::Quit.bit(), BridgeRequest::ToggleHeartbeat.bit());
    }

    #[test]
    fn test_only_heartbeat_toggle_coalesces() {
        assert!(BridgeRequest::ToggleHeartbeat.is_toggle());
        assert!(!BridgeRequest::Quit.is_toggle());
        assert!(!MainRequest::UserQuit.is_toggle());
        assert!(!ConsoleRequest::Quit.is_toggle());
    }

    #[test]
    fn test_quit_handle_raises_user_quit() {
        let main = Arc::new(SyncSignal::new());
        let handle = QuitHandle::new(main.clone());
        handle.clone().quit();
        assert!(main.is_pending(MainRequest::UserQuit));
        assert!(!main.is_pending(MainRequest::LinkEvent));
    }
}
