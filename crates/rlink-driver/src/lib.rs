//! 会话核心模块
//!
//! 本模块把 rlink 控制台拆成三个协作线程：
//! - 控制台线程（`InputDispatcher`）：读取动作、修改下行命令
//! - 桥接线程（`CommandBridge`）：心跳 + 差分下发
//! - 主线程（`TelemetryIngest`）：等待链路事件、拉取并发布遥测
//!
//! 线程之间只通过 `SharedState`（整体快照）和 `SyncSignal`（请求集合）交互，
//! 由 `Supervisor` 负责组装、启动和有序关闭。

pub mod bridge;
mod config;
pub mod console;
mod context;
pub mod control;
mod error;
pub mod ingest;
pub mod metrics;
mod supervisor;
pub mod sync;
mod worker;

pub use bridge::{BridgeFlow, CommandBridge, ForwardReport};
pub use config::SessionConfig;
pub use console::{
    Action, ChannelInput, ConsoleFlow, InputDispatcher, InputSource, NoInput, ScriptedInput,
};
pub use context::SessionContext;
pub use control::{BridgeRequest, ConsoleRequest, MainRequest, QuitHandle};
pub use error::SessionError;
pub use ingest::{ShutdownReason, TelemetryIngest};
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use supervisor::{SessionReport, Supervisor};
pub use sync::{
    ReadinessGate, Request, SharedState, SignalGuard, SyncSignal, WaitStatus, WorkerGates,
};
