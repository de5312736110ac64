//! 会话监督
//!
//! 组装共享上下文、注册链路事件回调、启动控制台和桥接线程，在调用线程上
//! 运行主事件循环，结束时按固定顺序停止全部工作线程。
//!
//! # 关闭流程
//!
//! 无论会话因何结束，都向桥接线程和控制台线程各投递一次 `Quit`，
//! 在 `shutdown_timeout` 内等待两者的 `stopped` 门，然后 join。
//! 投递和等待共用同一个截止时间；超时未退出的线程被分离，
//! 并以 `SessionError::ShutdownTimeout` 报告。分离的线程仍会收到 `Quit`，
//! 解除阻塞后自行退出。

use crate::bridge::CommandBridge;
use crate::config::SessionConfig;
use crate::console::{InputDispatcher, InputSource, NoInput};
use crate::context::SessionContext;
use crate::control::{BridgeRequest, ConsoleRequest, MainRequest, QuitHandle};
use crate::error::SessionError;
use crate::ingest::{ShutdownReason, TelemetryIngest};
use crate::metrics::MetricsSnapshot;
use crate::sync::{Request, SyncSignal, WorkerGates};
use crate::worker::spawn_named;
use rlink_device::{EventNotifier, Link};
use rlink_protocol::{IncomingTelemetry, LinkEvents, OutgoingCommand};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// 会话结束报告
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    pub reason: ShutdownReason,
    pub metrics: MetricsSnapshot,
    /// 结束时的下行命令
    pub last_command: OutgoingCommand,
    /// 最后一次发布的遥测
    pub last_telemetry: IncomingTelemetry,
}

/// 已启动的工作线程
struct Worker {
    name: &'static str,
    gates: WorkerGates,
    thread: JoinHandle<()>,
}

/// 会话监督者（Builder 风格）
///
/// # Example
///
/// ```no_run
/// use rlink_device::{Link, SimulatedLink};
/// use rlink_driver::{ScriptedInput, Supervisor};
/// use std::sync::Arc;
///
/// let link = Arc::new(SimulatedLink::default());
/// link.open().unwrap();
/// let report = Supervisor::new(link.clone())
///     .input(ScriptedInput::new("0\n12\n19\n"))
///     .output(std::io::stdout())
///     .run()
///     .unwrap();
/// println!("session ended: {}", report.reason);
/// link.close().unwrap();
/// ```
pub struct Supervisor<L> {
    link: Arc<L>,
    config: SessionConfig,
    input: Box<dyn InputSource>,
    output: Box<dyn Write + Send>,
    ctx: SessionContext,
}

impl<L: Link + 'static> Supervisor<L> {
    /// 创建监督者（默认配置、无输入、输出丢弃）
    pub fn new(link: Arc<L>) -> Self {
        Self {
            link,
            config: SessionConfig::default(),
            input: Box::new(NoInput),
            output: Box::new(io::sink()),
            ctx: SessionContext::new(),
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// 控制台输入源
    pub fn input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// 控制台输出（菜单、转储）
    pub fn output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// 外部退出句柄（可在 `run()` 之前获取）
    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle::new(self.ctx.main.clone())
    }

    /// 运行会话直到结束
    pub fn run(self) -> Result<SessionReport, SessionError> {
        self.config.validate()?;
        let Supervisor {
            link,
            config,
            input,
            output,
            ctx,
        } = self;

        let main = ctx.main.clone();
        let notifier: EventNotifier = Arc::new(move || main.raise(MainRequest::LinkEvent));
        link.set_event_notification(
            LinkEvents::DISCONNECTED | LinkEvents::ERROR | LinkEvents::DATA_READY,
            Some(notifier),
        )?;

        let result = run_session(&link, &config, input, output, &ctx);

        if let Err(e) = link.set_event_notification(LinkEvents::empty(), None) {
            warn!("Supervisor: failed to clear event notification: {}", e);
        }

        let reason = result?;
        let report = SessionReport {
            reason,
            metrics: ctx.metrics.snapshot(),
            last_command: ctx.command.snapshot(),
            last_telemetry: ctx.telemetry.snapshot(),
        };
        info!("Supervisor: session ended ({})", report.reason);
        Ok(report)
    }
}

fn run_session<L: Link + 'static>(
    link: &Arc<L>,
    config: &SessionConfig,
    input: Box<dyn InputSource>,
    output: Box<dyn Write + Send>,
    ctx: &SessionContext,
) -> Result<ShutdownReason, SessionError> {
    let mut workers = Vec::with_capacity(2);

    let console = InputDispatcher::new(input, output, ctx.clone(), config);
    let console_gates = WorkerGates::new();
    match spawn_named("rlink-console", {
        let gates = console_gates.clone();
        move || console.run(gates)
    }) {
        Ok(thread) => workers.push(Worker {
            name: "console",
            gates: console_gates,
            thread,
        }),
        Err(e) => {
            error!("Supervisor: failed to spawn console thread: {}", e);
            return Err(SessionError::Spawn(e));
        },
    }

    let bridge = CommandBridge::new(link.clone(), ctx.clone(), config);
    let bridge_gates = WorkerGates::new();
    match spawn_named("rlink-bridge", {
        let gates = bridge_gates.clone();
        move || bridge.run(gates)
    }) {
        Ok(thread) => workers.push(Worker {
            name: "bridge",
            gates: bridge_gates,
            thread,
        }),
        Err(e) => {
            error!("Supervisor: failed to spawn bridge thread: {}", e);
            // 关闭失败只会被记录，优先报告创建失败
            let _ = shutdown(workers, ctx, config);
            return Err(SessionError::Spawn(e));
        },
    }

    let deadline = Instant::now() + config.startup_timeout;
    if let Some(worker) = workers
        .iter()
        .find(|w| !w.gates.started.wait_timeout(deadline.saturating_duration_since(Instant::now())))
    {
        let name = worker.name;
        error!("Supervisor: {} worker did not start in time", name);
        let _ = shutdown(workers, ctx, config);
        return Err(SessionError::StartupTimeout { worker: name });
    }
    info!("Supervisor: workers started");

    let reason = TelemetryIngest::new(link.clone(), ctx.clone()).run();

    shutdown(workers, ctx, config)?;
    Ok(reason)
}

/// 停止全部工作线程
fn shutdown(
    workers: Vec<Worker>,
    ctx: &SessionContext,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    let deadline = Instant::now() + config.shutdown_timeout;
    let remaining = || deadline.saturating_duration_since(Instant::now());

    deliver_quit("bridge", &ctx.bridge, BridgeRequest::Quit, remaining());
    deliver_quit("console", &ctx.console, ConsoleRequest::Quit, remaining());

    let mut stuck = None;
    for worker in workers {
        if worker.gates.stopped.wait_timeout(remaining()) {
            if worker.thread.join().is_err() {
                warn!("Supervisor: {} thread panicked", worker.name);
            }
        } else {
            error!(
                "Supervisor: {} worker did not stop within {:?}, detaching",
                worker.name, config.shutdown_timeout
            );
            stuck.get_or_insert(worker.name);
        }
    }

    match stuck {
        Some(worker) => Err(SessionError::ShutdownTimeout { worker }),
        None => {
            info!("Supervisor: all workers stopped");
            Ok(())
        },
    }
}

/// 投递 `Quit`
///
/// 工作线程在循环体内持有自己的信号锁。截止时间内拿不到锁时，改由后台
/// 线程阻塞投递，线程一旦回到等待就会收到退出请求。
fn deliver_quit<R>(
    worker: &'static str,
    signal: &Arc<SyncSignal<R>>,
    request: R,
    timeout: Duration,
) where
    R: Request + Send + 'static,
{
    if signal.try_raise_for(request, timeout) {
        return;
    }

    warn!("Supervisor: {} is busy, delivering quit in the background", worker);
    let signal = signal.clone();
    if let Err(e) = spawn_named(&format!("rlink-quit-{worker}"), move || signal.raise(request)) {
        error!("Supervisor: failed to spawn quit delivery for {}: {}", worker, e);
    }
}
