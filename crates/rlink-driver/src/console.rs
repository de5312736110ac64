//! 控制台线程
//!
//! 按行读取动作编号，修改下行命令状态或向其他线程投递请求。
//! 输入源由调用方提供（`InputSource`），输出写入调用方提供的 `Write`。

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::control::{BridgeRequest, ConsoleRequest, MainRequest};
use crate::metrics::SessionMetrics;
use crate::sync::{WaitStatus, WorkerGates};
use crate::worker::ExitGuard;
use crossbeam_channel::{Receiver, TryRecvError};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use rlink_protocol::{AxisDirection, Light, OutgoingCommand};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, trace};

/// 控制台动作（编号即输入值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    Neutral = 4,
    ButtonPress = 5,
    ButtonRelease = 6,
    ToggleBrakeLight = 7,
    ToggleDipLight = 8,
    ToggleHazardLight = 9,
    ToggleLeftLight = 10,
    ToggleRightLight = 11,
    ToggleHorn = 12,
    AxisUp = 13,
    AxisDown = 14,
    AxisStop = 15,
    ToggleHeartbeat = 16,
    TriggerError = 17,
    Dump = 18,
    Quit = 19,
}

impl Action {
    /// 动作数量
    pub const COUNT: usize = 20;

    /// 按编号排列的全部动作
    pub const ALL: [Action; Action::COUNT] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Neutral,
        Action::ButtonPress,
        Action::ButtonRelease,
        Action::ToggleBrakeLight,
        Action::ToggleDipLight,
        Action::ToggleHazardLight,
        Action::ToggleLeftLight,
        Action::ToggleRightLight,
        Action::ToggleHorn,
        Action::AxisUp,
        Action::AxisDown,
        Action::AxisStop,
        Action::ToggleHeartbeat,
        Action::TriggerError,
        Action::Dump,
        Action::Quit,
    ];

    /// 解析一行输入：动作编号，或字面量 `quit`
    pub fn parse(line: &str) -> Option<Action> {
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") {
            return Some(Action::Quit);
        }
        line.parse::<u8>()
            .ok()
            .and_then(|code| Action::try_from(code).ok())
    }

    /// 菜单描述
    pub fn description(self) -> &'static str {
        match self {
            Action::Up => "Move up",
            Action::Down => "Move down",
            Action::Left => "Move left",
            Action::Right => "Move right",
            Action::Neutral => "Neutral position",
            Action::ButtonPress => "Press button (yellow tip)",
            Action::ButtonRelease => "Release button (yellow tip)",
            Action::ToggleBrakeLight => "Toggle brake light",
            Action::ToggleDipLight => "Toggle dip light",
            Action::ToggleHazardLight => "Toggle hazard light",
            Action::ToggleLeftLight => "Toggle left indicator",
            Action::ToggleRightLight => "Toggle right indicator",
            Action::ToggleHorn => "Toggle horn",
            Action::AxisUp => "Axis 0 up",
            Action::AxisDown => "Axis 0 down",
            Action::AxisStop => "Axis 0 stop",
            Action::ToggleHeartbeat => "Toggle heartbeat",
            Action::TriggerError => "Trigger error",
            Action::Dump => "Dump telemetry",
            Action::Quit => "Quit",
        }
    }

    /// 是否只修改下行命令
    pub fn mutates_command(self) -> bool {
        !matches!(self, Action::ToggleHeartbeat | Action::Dump | Action::Quit)
    }

    /// 把动作应用到下行命令（非命令类动作不做任何修改）
    pub fn apply(self, cmd: &mut OutgoingCommand) {
        match self {
            Action::Up => cmd.step_up(),
            Action::Down => cmd.step_down(),
            Action::Left => cmd.step_left(),
            Action::Right => cmd.step_right(),
            Action::Neutral => cmd.neutral(),
            Action::ButtonPress => cmd.button = true,
            Action::ButtonRelease => cmd.button = false,
            Action::ToggleBrakeLight => cmd.toggle_light(Light::Brake),
            Action::ToggleDipLight => cmd.toggle_light(Light::Dip),
            Action::ToggleHazardLight => cmd.toggle_light(Light::Hazard),
            Action::ToggleLeftLight => cmd.toggle_light(Light::Left),
            Action::ToggleRightLight => cmd.toggle_light(Light::Right),
            Action::ToggleHorn => cmd.horn = !cmd.horn,
            Action::AxisUp => cmd.axis = AxisDirection::Up,
            Action::AxisDown => cmd.axis = AxisDirection::Down,
            Action::AxisStop => cmd.axis = AxisDirection::None,
            Action::TriggerError => cmd.error = 0x01,
            Action::ToggleHeartbeat | Action::Dump | Action::Quit => {},
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}: {}", u8::from(*self), self.description())
    }
}

/// 输入源
///
/// 控制台线程在轮询时非阻塞地读取字符。
pub trait InputSource: Send {
    /// 当前是否有可读字符
    fn input_available(&mut self) -> bool;

    /// 读取一个字符（没有可读字符时返回 `None`）
    fn read_char(&mut self) -> Option<char>;

    /// 输入已结束（不会再有字符）
    fn is_closed(&self) -> bool {
        false
    }
}

/// 由读取线程通过通道喂入的输入
///
/// 发送端全部断开且通道读空后视为结束。
pub struct ChannelInput {
    rx: Receiver<char>,
    peeked: Option<char>,
    closed: bool,
}

impl ChannelInput {
    pub fn new(rx: Receiver<char>) -> Self {
        Self {
            rx,
            peeked: None,
            closed: false,
        }
    }

    fn fill(&mut self) {
        if self.peeked.is_some() || self.closed {
            return;
        }
        match self.rx.try_recv() {
            Ok(c) => self.peeked = Some(c),
            Err(TryRecvError::Empty) => {},
            Err(TryRecvError::Disconnected) => self.closed = true,
        }
    }
}

impl InputSource for ChannelInput {
    fn input_available(&mut self) -> bool {
        self.fill();
        self.peeked.is_some()
    }

    fn read_char(&mut self) -> Option<char> {
        self.fill();
        self.peeked.take()
    }

    fn is_closed(&self) -> bool {
        self.closed && self.peeked.is_none()
    }
}

/// 固定字符序列输入（脚本、测试）
///
/// 读完即结束。
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    chars: VecDeque<char>,
}

impl ScriptedInput {
    pub fn new(script: &str) -> Self {
        Self {
            chars: script.chars().collect(),
        }
    }

    /// 由动作序列生成脚本（每个动作一行）
    pub fn from_actions(actions: &[Action]) -> Self {
        let script: String = actions
            .iter()
            .map(|a| format!("{}\n", u8::from(*a)))
            .collect();
        Self::new(&script)
    }
}

impl InputSource for ScriptedInput {
    fn input_available(&mut self) -> bool {
        !self.chars.is_empty()
    }

    fn read_char(&mut self) -> Option<char> {
        self.chars.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.chars.is_empty()
    }
}

/// 永远没有输入、也不会结束（会话只能由链路事件或退出句柄结束）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn input_available(&mut self) -> bool {
        false
    }

    fn read_char(&mut self) -> Option<char> {
        None
    }
}

/// 处理输入后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Quit,
}

/// 控制台输入分发器
pub struct InputDispatcher {
    input: Box<dyn InputSource>,
    output: Box<dyn Write + Send>,
    ctx: SessionContext,
    line: Vec<char>,
    line_limit: usize,
    poll: Duration,
}

impl InputDispatcher {
    pub fn new(
        input: Box<dyn InputSource>,
        output: Box<dyn Write + Send>,
        ctx: SessionContext,
        config: &SessionConfig,
    ) -> Self {
        Self {
            input,
            output,
            ctx,
            line: Vec::with_capacity(config.line_limit),
            line_limit: config.line_limit.max(1),
            poll: config.console_poll,
        }
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        let result = self
            .output
            .write_fmt(args)
            .and_then(|()| self.output.flush());
        if let Err(e) = result {
            debug!("Console: output write failed: {}", e);
        }
    }

    /// 打印动作菜单
    pub fn print_menu(&mut self) {
        let mut menu = String::from("\nActions:\n");
        for action in Action::ALL {
            menu.push_str(&format!("  {}\n", action));
        }
        menu.push_str("> ");
        self.emit(format_args!("{}", menu));
    }

    /// 读取所有当前可读字符并处理完整的行
    pub fn poll_input(&mut self) -> ConsoleFlow {
        while self.input.input_available() {
            let Some(c) = self.input.read_char() else {
                break;
            };

            if c == '\r' || c == '\n' {
                let line: String = self.line.drain(..).collect();
                if self.handle_line(&line) == ConsoleFlow::Quit {
                    return ConsoleFlow::Quit;
                }
            } else if self.line.len() < self.line_limit {
                self.line.push(c);
            } else if let Some(last) = self.line.last_mut() {
                *last = c;
            }
        }

        if self.input.is_closed() {
            info!("Console: input closed, quitting");
            return self.execute(Action::Quit);
        }
        ConsoleFlow::Continue
    }

    /// 处理一行输入（空行忽略）
    pub fn handle_line(&mut self, line: &str) -> ConsoleFlow {
        if line.trim().is_empty() {
            return ConsoleFlow::Continue;
        }

        match Action::parse(line) {
            Some(action) => {
                let flow = self.execute(action);
                if flow == ConsoleFlow::Continue {
                    self.print_menu();
                }
                flow
            },
            None => {
                debug!("Console: invalid input {:?}", line);
                SessionMetrics::incr(&self.ctx.metrics.invalid_inputs);
                self.emit(format_args!("Invalid input\n"));
                self.print_menu();
                ConsoleFlow::Continue
            },
        }
    }

    /// 执行一个动作
    pub fn execute(&mut self, action: Action) -> ConsoleFlow {
        debug!("Console: {}", action.description());
        SessionMetrics::incr(&self.ctx.metrics.actions_executed);

        if action.mutates_command() {
            self.ctx.command.with_lock(|cmd| action.apply(cmd));
            return ConsoleFlow::Continue;
        }

        match action {
            Action::ToggleHeartbeat => {
                self.ctx.bridge.raise(BridgeRequest::ToggleHeartbeat);
                ConsoleFlow::Continue
            },
            Action::Dump => {
                let telemetry = self.ctx.telemetry.snapshot();
                self.emit(format_args!("{}", telemetry));
                ConsoleFlow::Continue
            },
            _ => {
                info!("Console: quit");
                self.ctx.main.raise(MainRequest::UserQuit);
                ConsoleFlow::Quit
            },
        }
    }

    /// 线程主循环
    pub fn run(mut self, gates: WorkerGates) {
        let mut exit = ExitGuard::new("Console", gates.stopped.clone(), self.ctx.main.clone());
        let signal = self.ctx.console.clone();
        let mut guard = signal.lock();
        gates.started.post();
        info!("Console: started");
        self.print_menu();

        loop {
            match guard.wait_timeout(self.poll) {
                WaitStatus::Signaled => {
                    if guard.take(ConsoleRequest::Quit) {
                        info!("Console: quit requested");
                        break;
                    }
                },
                WaitStatus::TimedOut => {
                    trace!("Console: poll");
                    if self.poll_input() == ConsoleFlow::Quit {
                        break;
                    }
                },
            }
        }

        drop(guard);
        exit.disarm();
        info!("Console: loop exited");
    }
}
