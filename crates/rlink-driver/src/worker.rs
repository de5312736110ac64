//! 工作线程的启动与退出守卫

use crate::control::MainRequest;
use crate::sync::{ReadinessGate, SyncSignal};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::error;

/// 退出守卫
///
/// Drop 时总是 post `stopped`；如果线程不是经 `disarm()` 正常退出
/// （例如 panic 展开），先向主线程投递 `WorkerFault`。
///
/// 必须在信号锁之前创建，保证 Drop 时信号锁已经释放。
pub(crate) struct ExitGuard {
    worker: &'static str,
    stopped: ReadinessGate,
    main: Arc<SyncSignal<MainRequest>>,
    clean: bool,
}

impl ExitGuard {
    pub(crate) fn new(
        worker: &'static str,
        stopped: ReadinessGate,
        main: Arc<SyncSignal<MainRequest>>,
    ) -> Self {
        Self {
            worker,
            stopped,
            main,
            clean: false,
        }
    }

    /// 标记为正常退出
    pub(crate) fn disarm(&mut self) {
        self.clean = true;
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if !self.clean || thread::panicking() {
            error!("{}: worker exited abnormally", self.worker);
            self.main.raise(MainRequest::WorkerFault);
        }
        self.stopped.post();
    }
}

/// 创建具名工作线程
pub(crate) fn spawn_named<F>(name: &str, body: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(body)
}
