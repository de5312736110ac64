//! 同步原语
//!
//! - `SyncSignal<R>`: 互斥锁 + 条件变量，携带一组待处理请求
//! - `SharedState<T>`: 整体快照读写的共享状态容器
//! - `ReadinessGate` / `WorkerGates`: 工作线程的启动/退出握手
//!
//! 锁全部来自 `parking_lot`，不会因线程 panic 而中毒。

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// 可投递到 `SyncSignal` 的请求
///
/// 每个变体映射到互不相同的一个比特位。
pub trait Request: Copy + fmt::Debug {
    /// 请求对应的比特位
    fn bit(self) -> u32;

    /// 翻转型请求：投递时按 XOR 合并，两次未消费的翻转互相抵消
    fn is_toggle(self) -> bool {
        false
    }
}

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// 有待处理请求
    Signaled,
    /// 超时窗口内没有请求
    TimedOut,
}

/// 请求信号（mutex + condvar）
///
/// 信号本身从不清除请求，由持锁的消费者通过 `SignalGuard::take` 逐个取走。
pub struct SyncSignal<R> {
    pending: Mutex<u32>,
    condvar: Condvar,
    _request: PhantomData<fn(R)>,
}

impl<R: Request> SyncSignal<R> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(0),
            condvar: Condvar::new(),
            _request: PhantomData,
        }
    }

    /// 投递请求并唤醒一个等待者
    pub fn raise(&self, request: R) {
        let mut pending = self.pending.lock();
        self.merge(&mut pending, request);
    }

    /// 限时投递：信号锁在 `timeout` 内拿不到时放弃并返回 `false`
    ///
    /// 用于关闭流程，持锁卡死的工作线程不会拖住调用方。
    pub fn try_raise_for(&self, request: R, timeout: Duration) -> bool {
        match self.pending.try_lock_for(timeout) {
            Some(mut pending) => {
                self.merge(&mut pending, request);
                true
            },
            None => false,
        }
    }

    fn merge(&self, pending: &mut u32, request: R) {
        if request.is_toggle() {
            *pending ^= request.bit();
        } else {
            *pending |= request.bit();
        }
        self.condvar.notify_one();
    }

    /// 获取信号锁
    ///
    /// 工作线程在整个循环体内持有该锁，只在等待期间释放。
    pub fn lock(&self) -> SignalGuard<'_, R> {
        SignalGuard {
            signal: self,
            pending: self.pending.lock(),
        }
    }

    /// 某个请求当前是否待处理（短暂加锁）
    pub fn is_pending(&self, request: R) -> bool {
        *self.pending.lock() & request.bit() != 0
    }
}

impl<R: Request> Default for SyncSignal<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for SyncSignal<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSignal")
            .field("pending", &format_args!("{:#x}", *self.pending.lock()))
            .finish()
    }
}

/// 持有信号锁期间的句柄
pub struct SignalGuard<'a, R> {
    signal: &'a SyncSignal<R>,
    pending: MutexGuard<'a, u32>,
}

impl<R: Request> SignalGuard<'_, R> {
    /// 无限期等待，直到至少有一个请求待处理
    pub fn wait(&mut self) -> WaitStatus {
        while *self.pending == 0 {
            self.signal.condvar.wait(&mut self.pending);
        }
        WaitStatus::Signaled
    }

    /// 最多等待 `timeout`
    ///
    /// 进入时已有请求则立即返回 `Signaled`。
    pub fn wait_timeout(&mut self, timeout: Duration) -> WaitStatus {
        let deadline = Instant::now() + timeout;
        while *self.pending == 0 {
            if self
                .signal
                .condvar
                .wait_until(&mut self.pending, deadline)
                .timed_out()
            {
                break;
            }
        }

        if *self.pending == 0 {
            WaitStatus::TimedOut
        } else {
            WaitStatus::Signaled
        }
    }

    /// 取走一个请求，返回它是否待处理；其余请求保留
    pub fn take(&mut self, request: R) -> bool {
        let bit = request.bit();
        let was_pending = *self.pending & bit != 0;
        if was_pending {
            *self.pending ^= bit;
        }
        was_pending
    }

    pub fn contains(&self, request: R) -> bool {
        *self.pending & request.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        *self.pending == 0
    }
}

/// 共享状态容器
///
/// 读取方拿到整体副本；写入方在一次加锁内完成修改，不存在按字段加锁。
#[derive(Debug, Default)]
pub struct SharedState<T> {
    inner: Mutex<T>,
}

impl<T> SharedState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// 在锁内执行修改（任何退出路径都会释放锁）
    pub fn with_lock<F, Ret>(&self, f: F) -> Ret
    where
        F: FnOnce(&mut T) -> Ret,
    {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    /// 一次加锁整体替换
    pub fn publish(&self, value: T) {
        *self.inner.lock() = value;
    }
}

impl<T: Copy> SharedState<T> {
    /// 整体快照
    pub fn snapshot(&self) -> T {
        *self.inner.lock()
    }
}

/// 二值信号量（容量为 1 的有界通道）
///
/// 重复的 `post` 会被丢弃。
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self { tx, rx }
    }

    pub fn post(&self) {
        let _ = self.tx.try_send(());
    }

    /// 阻塞直到被 post
    pub fn wait(&self) {
        // 自身持有发送端，通道不会断开
        let _ = self.rx.recv();
    }

    /// 限时等待，返回是否被 post
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

/// 工作线程的启动/退出门
#[derive(Debug, Clone, Default)]
pub struct WorkerGates {
    /// 已持有信号锁、即将进入等待循环
    pub started: ReadinessGate,
    /// 已释放信号锁、即将退出
    pub stopped: ReadinessGate,
}

impl WorkerGates {
    pub fn new() -> Self {
        Self::default()
    }
}
