//! 会话上下文（所有共享对象的聚合）

use crate::control::{BridgeRequest, ConsoleRequest, MainRequest};
use crate::metrics::SessionMetrics;
use crate::sync::{SharedState, SyncSignal};
use rlink_protocol::{IncomingTelemetry, OutgoingCommand};
use std::sync::Arc;

/// 会话上下文
///
/// 各工作线程持有同一组共享对象的 `Arc` 克隆：
/// - 两个共享状态：下行命令、上行遥测
/// - 三个信号：主线程、桥接线程、控制台线程各一个
/// - 会话指标
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// 下行命令（控制台写，桥接线程读）
    pub command: Arc<SharedState<OutgoingCommand>>,
    /// 上行遥测（主线程写，控制台读）
    pub telemetry: Arc<SharedState<IncomingTelemetry>>,
    pub main: Arc<SyncSignal<MainRequest>>,
    pub bridge: Arc<SyncSignal<BridgeRequest>>,
    pub console: Arc<SyncSignal<ConsoleRequest>>,
    pub metrics: Arc<SessionMetrics>,
}

impl SessionContext {
    /// 创建新的上下文（命令处于中立状态，遥测全零）
    pub fn new() -> Self {
        Self {
            command: Arc::new(SharedState::new(OutgoingCommand::default())),
            telemetry: Arc::new(SharedState::new(IncomingTelemetry::default())),
            main: Arc::new(SyncSignal::new()),
            bridge: Arc::new(SyncSignal::new()),
            console: Arc::new(SyncSignal::new()),
            metrics: Arc::new(SessionMetrics::new()),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
