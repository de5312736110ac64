//! 命令桥接线程
//!
//! 周期性读取下行命令快照，发送心跳，只把与上次发送相比发生变化的字段
//! 逐个下发给设备。
//!
//! # 下发顺序
//!
//! 位置（x/y 一次调用）→ 按键 → 喇叭 → 各灯 → 0 号轴 → 错误码
//!
//! 任何 setter 失败只记录日志和指标，不重试，也不终止循环；
//! 上次发送的快照照常更新。
//!
//! 收到 `Quit` 时先把尚未下发的变化补发一次（不发心跳），再退出。

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::control::BridgeRequest;
use crate::metrics::SessionMetrics;
use crate::sync::{SignalGuard, WaitStatus, WorkerGates};
use crate::worker::ExitGuard;
use rlink_device::{Link, LinkError};
use rlink_protocol::{AxisId, Button, Light, OutgoingCommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// 一次差分下发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForwardReport {
    /// 成功的 setter 调用数
    pub sent: u32,
    /// 失败的 setter 调用数
    pub failed: u32,
}

impl ForwardReport {
    /// 本次是否调用了任何 setter
    pub fn is_empty(&self) -> bool {
        self.sent == 0 && self.failed == 0
    }

    fn record(&mut self, field: &str, result: Result<(), LinkError>, metrics: &SessionMetrics) {
        match result {
            Ok(()) => {
                debug!("Bridge: forwarded {}", field);
                self.sent += 1;
                SessionMetrics::incr(&metrics.commands_sent);
            },
            Err(e) => {
                debug!("Bridge: failed to forward {}: {}", field, e);
                self.failed += 1;
                SessionMetrics::incr(&metrics.command_failures);
            },
        }
    }
}

/// 处理信号后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeFlow {
    Continue,
    Stop,
}

/// 命令桥接器（wheelchair 线程）
pub struct CommandBridge<L> {
    link: Arc<L>,
    ctx: SessionContext,
    /// 上次下发的命令（初始为中立状态）
    previous: OutgoingCommand,
    heartbeat_enabled: bool,
    poll: Duration,
}

impl<L: Link> CommandBridge<L> {
    pub fn new(link: Arc<L>, ctx: SessionContext, config: &SessionConfig) -> Self {
        Self {
            link,
            ctx,
            previous: OutgoingCommand::default(),
            heartbeat_enabled: config.heartbeat_on_start,
            poll: config.command_poll,
        }
    }

    pub fn heartbeat_enabled(&self) -> bool {
        self.heartbeat_enabled
    }

    /// 上次下发的命令
    pub fn previous(&self) -> &OutgoingCommand {
        &self.previous
    }

    /// 一次轮询：快照命令、（可选）心跳、差分下发
    pub fn tick(&mut self) -> ForwardReport {
        SessionMetrics::incr(&self.ctx.metrics.bridge_ticks);
        let current = self.ctx.command.snapshot();

        if self.heartbeat_enabled {
            match self.link.heartbeat() {
                Ok(()) => SessionMetrics::incr(&self.ctx.metrics.heartbeats_sent),
                Err(e) => {
                    debug!("Bridge: heartbeat failed: {}", e);
                    SessionMetrics::incr(&self.ctx.metrics.heartbeat_failures);
                },
            }
        }

        self.forward(&current)
    }

    /// 只下发与上次相比变化的字段，然后记住 `current`
    pub fn forward(&mut self, current: &OutgoingCommand) -> ForwardReport {
        let prev = self.previous;
        let metrics = self.ctx.metrics.clone();
        let link = &self.link;
        let mut report = ForwardReport::default();

        if current.x != prev.x || current.y != prev.y {
            report.record("position", link.set_xy(current.x, current.y), &metrics);
        }
        if current.button != prev.button {
            report.record(
                "button",
                link.set_button(Button::YellowTip, current.button),
                &metrics,
            );
        }
        if current.horn != prev.horn {
            report.record("horn", link.set_horn(current.horn), &metrics);
        }
        for light in Light::ALL {
            let on = current.light(light);
            if on != prev.light(light) {
                report.record(light.name(), link.set_light(light, on), &metrics);
            }
        }
        if current.axis != prev.axis {
            report.record(
                "axis",
                link.set_axis(AxisId::AXIS_0, current.axis),
                &metrics,
            );
        }
        if current.error != prev.error {
            report.record("error", link.set_error(current.error), &metrics);
        }

        self.previous = *current;
        report
    }

    /// 处理已投递的请求：退出优先，其次心跳翻转
    pub fn service(&mut self, guard: &mut SignalGuard<'_, BridgeRequest>) -> BridgeFlow {
        if guard.take(BridgeRequest::Quit) {
            info!("Bridge: quit requested");
            self.flush();
            return BridgeFlow::Stop;
        }
        if guard.take(BridgeRequest::ToggleHeartbeat) {
            self.heartbeat_enabled = !self.heartbeat_enabled;
            info!(
                "Bridge: heartbeat {}",
                if self.heartbeat_enabled { "enabled" } else { "disabled" }
            );
        }
        BridgeFlow::Continue
    }

    /// 退出前补发最后一次快照中尚未下发的变化
    fn flush(&mut self) {
        let current = self.ctx.command.snapshot();
        let report = self.forward(&current);
        if !report.is_empty() {
            debug!(
                "Bridge: flushed {} pending field(s) before exit ({} failed)",
                report.sent + report.failed,
                report.failed
            );
        }
    }

    /// 线程主循环
    pub fn run(mut self, gates: WorkerGates) {
        let mut exit = ExitGuard::new("Bridge", gates.stopped.clone(), self.ctx.main.clone());
        let signal = self.ctx.bridge.clone();
        let mut guard = signal.lock();
        gates.started.post();
        info!(
            "Bridge: started (poll {:?}, heartbeat {})",
            self.poll,
            if self.heartbeat_enabled { "on" } else { "off" }
        );

        loop {
            match guard.wait_timeout(self.poll) {
                WaitStatus::TimedOut => {
                    trace!("Bridge: poll");
                    self.tick();
                },
                WaitStatus::Signaled => {
                    if self.service(&mut guard) == BridgeFlow::Stop {
                        break;
                    }
                },
            }
        }

        drop(guard);
        exit.disarm();
        info!("Bridge: loop exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlink_device::{LinkCall, MockLink};
    use rlink_protocol::AxisDirection;

    fn bridge_with(config: SessionConfig) -> (Arc<MockLink>, SessionContext, CommandBridge<MockLink>) {
        let link = Arc::new(MockLink::new());
        let ctx = SessionContext::new();
        let bridge = CommandBridge::new(link.clone(), ctx.clone(), &config);
        (link, ctx, bridge)
    }

    #[test]
    fn test_unchanged_command_sends_only_heartbeat() {
        let (link, _ctx, mut bridge) = bridge_with(SessionConfig::default());
        let report = bridge.tick();
        assert!(report.is_empty());
        assert_eq!(link.calls(), vec![LinkCall::Heartbeat]);
    }

    #[test]
    fn test_heartbeat_disabled_on_start() {
        let (link, _ctx, mut bridge) = bridge_with(SessionConfig {
            heartbeat_on_start: false,
            ..Default::default()
        });
        bridge.tick();
        assert!(link.calls().is_empty());
    }

    #[test]
    fn test_changed_fields_sent_in_order() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        ctx.command.with_lock(|cmd| {
            cmd.error = 0x01;
            cmd.axis = AxisDirection::Down;
            cmd.lights[Light::Right.index()] = true;
            cmd.lights[Light::Brake.index()] = true;
            cmd.horn = true;
            cmd.button = true;
            cmd.x = -20;
        });

        let report = bridge.tick();
        assert_eq!(report.sent, 7);
        assert_eq!(
            link.calls(),
            vec![
                LinkCall::Heartbeat,
                LinkCall::SetXy { x: -20, y: 0 },
                LinkCall::SetButton {
                    button: Button::YellowTip,
                    pressed: true
                },
                LinkCall::SetHorn(true),
                LinkCall::SetLight {
                    light: Light::Brake,
                    on: true
                },
                LinkCall::SetLight {
                    light: Light::Right,
                    on: true
                },
                LinkCall::SetAxis {
                    axis: AxisId::AXIS_0,
                    direction: AxisDirection::Down
                },
                LinkCall::SetError(0x01),
            ]
        );
    }

    #[test]
    fn test_each_change_sent_once() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        ctx.command.with_lock(|cmd| cmd.horn = true);
        bridge.tick();
        bridge.tick();
        bridge.tick();
        assert_eq!(link.setter_calls(), vec![LinkCall::SetHorn(true)]);
        assert_eq!(link.count(LinkCall::Heartbeat), 3);
    }

    #[test]
    fn test_failed_setter_not_retried() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        link.fail_setters(Some(LinkError::Timeout));
        ctx.command.with_lock(|cmd| cmd.y = 20);

        let report = bridge.tick();
        assert_eq!(report, ForwardReport { sent: 0, failed: 1 });
        assert_eq!(bridge.previous().y, 20);

        link.fail_setters(None);
        assert!(bridge.tick().is_empty());

        let metrics = ctx.metrics.snapshot();
        assert_eq!(metrics.command_failures, 1);
        assert_eq!(metrics.commands_sent, 0);
        assert_eq!(metrics.bridge_ticks, 2);
    }

    #[test]
    fn test_heartbeat_failure_does_not_stop_forwarding() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        link.fail_heartbeat(Some(LinkError::Driver));
        ctx.command.with_lock(|cmd| cmd.horn = true);

        assert_eq!(bridge.tick().sent, 1);
        assert_eq!(ctx.metrics.snapshot().heartbeat_failures, 1);
    }

    #[test]
    fn test_quit_takes_precedence_over_toggle() {
        let (_link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        ctx.bridge.raise(BridgeRequest::ToggleHeartbeat);
        ctx.bridge.raise(BridgeRequest::Quit);

        let mut guard = ctx.bridge.lock();
        assert_eq!(bridge.service(&mut guard), BridgeFlow::Stop);
        assert!(guard.contains(BridgeRequest::ToggleHeartbeat));
        assert!(bridge.heartbeat_enabled());
    }

    #[test]
    fn test_quit_flushes_pending_changes() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        bridge.tick();
        link.clear_calls();

        ctx.command.with_lock(|cmd| {
            cmd.y = 20;
            cmd.horn = true;
        });
        ctx.bridge.raise(BridgeRequest::Quit);
        let mut guard = ctx.bridge.lock();
        assert_eq!(bridge.service(&mut guard), BridgeFlow::Stop);

        assert_eq!(
            link.calls(),
            vec![LinkCall::SetXy { x: 0, y: 20 }, LinkCall::SetHorn(true)]
        );
        assert_eq!(bridge.previous().y, 20);
    }

    #[test]
    fn test_quit_without_changes_touches_nothing() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        ctx.bridge.raise(BridgeRequest::Quit);
        let mut guard = ctx.bridge.lock();
        assert_eq!(bridge.service(&mut guard), BridgeFlow::Stop);
        assert!(link.calls().is_empty());
    }

    #[test]
    fn test_toggle_flips_heartbeat() {
        let (link, ctx, mut bridge) = bridge_with(SessionConfig::default());
        ctx.bridge.raise(BridgeRequest::ToggleHeartbeat);
        {
            let mut guard = ctx.bridge.lock();
            assert_eq!(bridge.service(&mut guard), BridgeFlow::Continue);
            assert!(guard.is_empty());
        }
        assert!(!bridge.heartbeat_enabled());

        bridge.tick();
        assert_eq!(link.count(LinkCall::Heartbeat), 0);
    }
}
