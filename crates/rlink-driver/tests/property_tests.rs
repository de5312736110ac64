//! 会话核心的属性测试
//!
//! 使用 proptest 验证移动边界、差分下发的最小性和心跳翻转的奇偶性。

use proptest::prelude::*;
use rlink_device::MockLink;
use rlink_driver::{
    Action, BridgeFlow, BridgeRequest, CommandBridge, InputDispatcher, NoInput, SessionConfig,
    SessionContext,
};
use rlink_protocol::{AxisDirection, Light, OutgoingCommand, POSITION_LIMIT, POSITION_STEP};
use std::sync::Arc;

fn movement() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Up),
        Just(Action::Down),
        Just(Action::Left),
        Just(Action::Right),
        Just(Action::Neutral),
    ]
}

fn command() -> impl Strategy<Value = OutgoingCommand> {
    (
        -100i8..=100,
        -100i8..=100,
        any::<bool>(),
        prop::array::uniform5(any::<bool>()),
        any::<bool>(),
        0u8..3,
        any::<u8>(),
    )
        .prop_map(|(x, y, button, lights, horn, axis, error)| OutgoingCommand {
            x,
            y,
            button,
            lights,
            horn,
            axis: AxisDirection::try_from(axis).unwrap_or_default(),
            error,
        })
}

/// 两个命令之间需要下发的 setter 数
fn changed_fields(prev: &OutgoingCommand, next: &OutgoingCommand) -> usize {
    let mut count = 0;
    if prev.x != next.x || prev.y != next.y {
        count += 1;
    }
    count += usize::from(prev.button != next.button);
    count += usize::from(prev.horn != next.horn);
    count += Light::ALL
        .iter()
        .filter(|&&l| prev.light(l) != next.light(l))
        .count();
    count += usize::from(prev.axis != next.axis);
    count += usize::from(prev.error != next.error);
    count
}

proptest! {
    /// 任意移动序列之后位置都在界内，且是步长的整数倍
    #[test]
    fn movement_stays_in_bounds(actions in prop::collection::vec(movement(), 0..64)) {
        let ctx = SessionContext::new();
        let mut dispatcher = InputDispatcher::new(
            Box::new(NoInput),
            Box::new(std::io::sink()),
            ctx.clone(),
            &SessionConfig::default(),
        );

        for action in &actions {
            dispatcher.execute(*action);
            let cmd = ctx.command.snapshot();
            prop_assert!(cmd.x.abs() <= POSITION_LIMIT);
            prop_assert!(cmd.y.abs() <= POSITION_LIMIT);
            prop_assert_eq!(cmd.x % POSITION_STEP, 0);
            prop_assert_eq!(cmd.y % POSITION_STEP, 0);
            if *action == Action::Neutral {
                prop_assert_eq!((cmd.x, cmd.y), (0, 0));
            }
        }
    }

    /// 每次下发的 setter 数恰好等于变化的字段数
    #[test]
    fn forward_sends_only_changes(commands in prop::collection::vec(command(), 1..16)) {
        let link = Arc::new(MockLink::new());
        let ctx = SessionContext::new();
        let mut bridge = CommandBridge::new(link.clone(), ctx, &SessionConfig::default());

        let mut prev = OutgoingCommand::default();
        for cmd in &commands {
            link.clear_calls();
            let report = bridge.forward(cmd);
            prop_assert_eq!(report.sent as usize, changed_fields(&prev, cmd));
            prop_assert_eq!(link.setter_calls().len(), report.sent as usize);

            link.clear_calls();
            prop_assert!(bridge.forward(cmd).is_empty());
            prop_assert!(link.calls().is_empty());
            prev = *cmd;
        }
    }

    /// 心跳开关等于初始值异或翻转次数的奇偶
    #[test]
    fn heartbeat_toggle_parity(initial in any::<bool>(), batches in prop::collection::vec(0usize..5, 1..8)) {
        let link = Arc::new(MockLink::new());
        let ctx = SessionContext::new();
        let config = SessionConfig {
            heartbeat_on_start: initial,
            ..Default::default()
        };
        let mut bridge = CommandBridge::new(link, ctx.clone(), &config);

        let mut total = 0usize;
        for toggles in batches {
            for _ in 0..toggles {
                ctx.bridge.raise(BridgeRequest::ToggleHeartbeat);
            }
            total += toggles;
            let mut guard = ctx.bridge.lock();
            prop_assert_eq!(bridge.service(&mut guard), BridgeFlow::Continue);
            prop_assert!(guard.is_empty());
            drop(guard);
            prop_assert_eq!(bridge.heartbeat_enabled(), initial ^ (total % 2 == 1));
        }
    }
}
