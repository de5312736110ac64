//! 遥测接收与主事件循环
//!
//! 主线程无限期等待自己的信号。链路事件回调只投递 `LinkEvent`，
//! 真正的状态查询和遥测拉取都在主线程持有信号锁时完成。

use crate::context::SessionContext;
use crate::control::MainRequest;
use crate::metrics::SessionMetrics;
use rlink_device::{Link, LinkError};
use rlink_protocol::{IncomingTelemetry, Light, LinkEvents, LinkFault};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, trace, warn};

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户退出（控制台 quit 或外部退出句柄）
    UserQuit,
    /// 设备断开
    LinkDisconnected,
    /// 设备报告链路错误
    LinkError(LinkFault),
    /// 工作线程异常退出
    WorkerFault,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::UserQuit => write!(f, "user quit"),
            ShutdownReason::LinkDisconnected => write!(f, "link disconnected"),
            ShutdownReason::LinkError(fault) => write!(f, "link error ({:?})", fault),
            ShutdownReason::WorkerFault => write!(f, "worker fault"),
        }
    }
}

/// 拉取单个子项；失败时保留旧值
fn pull<T>(field: &str, result: Result<T, LinkError>, slot: &mut T, failures: &mut u32) {
    match result {
        Ok(value) => *slot = value,
        Err(e) => {
            debug!("Main: failed to read {}: {}", field, e);
            *failures += 1;
        },
    }
}

/// 遥测接收器
pub struct TelemetryIngest<L> {
    link: Arc<L>,
    ctx: SessionContext,
    /// 暂存区（跨轮次保留，单项失败时沿用上次的值）
    staging: IncomingTelemetry,
}

impl<L: Link> TelemetryIngest<L> {
    pub fn new(link: Arc<L>, ctx: SessionContext) -> Self {
        Self {
            link,
            ctx,
            staging: IncomingTelemetry::default(),
        }
    }

    /// 逐项拉取遥测并整体发布，返回失败的子项数
    pub fn refresh(&mut self) -> u32 {
        let link = &self.link;
        let t = &mut self.staging;
        let mut failures = 0;

        pull("status", link.device_status(), &mut t.status, &mut failures);
        pull("mode", link.mode(), &mut t.hms.mode, &mut failures);
        pull("profile", link.profile(), &mut t.hms.profile, &mut failures);
        pull(
            "process selection",
            link.process_selection(),
            &mut t.hms.processes,
            &mut failures,
        );
        pull("horn", link.horn(), &mut t.horn, &mut failures);
        pull("battery", link.battery(), &mut t.battery, &mut failures);
        pull("velocity", link.velocity(), &mut t.velocity, &mut failures);
        pull("speed", link.speed(), &mut t.speed, &mut failures);
        for light in Light::ALL {
            pull(
                light.name(),
                link.light(light),
                &mut t.lights[light.index()],
                &mut failures,
            );
        }
        pull("errors", link.error_codes(), &mut t.errors, &mut failures);

        self.ctx.telemetry.publish(self.staging);

        let metrics = &self.ctx.metrics;
        SessionMetrics::incr(&metrics.telemetry_cycles);
        if failures > 0 {
            metrics
                .telemetry_failures
                .fetch_add(u64::from(failures), Ordering::Relaxed);
        }
        trace!("Main: telemetry published ({} failures)", failures);
        failures
    }

    /// 处理一组链路事件；致命事件返回结束原因
    ///
    /// 优先级：ERROR → DISCONNECTED → DATA_READY。
    pub fn dispatch(&mut self, events: LinkEvents) -> Option<ShutdownReason> {
        if events.contains(LinkEvents::ERROR) {
            let fault = match self.link.latest_error() {
                Ok(fault) => fault,
                Err(e) => {
                    warn!("Main: failed to read latest link error: {}", e);
                    LinkFault::None
                },
            };
            error!("Main: link error reported ({:?})", fault);
            return Some(ShutdownReason::LinkError(fault));
        }
        if events.contains(LinkEvents::DISCONNECTED) {
            warn!("Main: link disconnected");
            return Some(ShutdownReason::LinkDisconnected);
        }
        if events.contains(LinkEvents::DATA_READY) {
            self.refresh();
        }
        None
    }

    /// 主事件循环，直到出现结束原因
    ///
    /// 优先级：UserQuit → WorkerFault → LinkEvent。
    pub fn run(&mut self) -> ShutdownReason {
        let signal = self.ctx.main.clone();
        let mut guard = signal.lock();
        info!("Main: waiting for link events");

        loop {
            guard.wait();
            trace!("Main: woke up");

            if guard.take(MainRequest::UserQuit) {
                info!("Main: user quit");
                return ShutdownReason::UserQuit;
            }
            if guard.take(MainRequest::WorkerFault) {
                error!("Main: a worker exited abnormally");
                return ShutdownReason::WorkerFault;
            }
            if guard.take(MainRequest::LinkEvent) {
                SessionMetrics::incr(&self.ctx.metrics.link_events);
                match self.link.status() {
                    Ok(events) => {
                        if let Some(reason) = self.dispatch(events) {
                            return reason;
                        }
                    },
                    Err(e) => warn!("Main: link status query failed: {}", e),
                }
            }
        }
    }
}
