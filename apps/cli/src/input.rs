//! 标准输入读取线程
//!
//! 阻塞读取 stdin，逐字符喂给控制台线程；读到 EOF 后关闭通道，
//! 控制台随之结束会话。

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use rlink_driver::ChannelInput;
use std::io::{self, BufRead};
use std::thread;
use tracing::debug;

/// 启动 stdin 读取线程（分离运行）
pub fn spawn_stdin_reader() -> Result<ChannelInput> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("rlink-stdin".into())
        .spawn(move || read_lines(io::stdin().lock(), tx))
        .context("Failed to spawn stdin reader thread")?;
    Ok(ChannelInput::new(rx))
}

fn read_lines(mut reader: impl BufRead, tx: Sender<char>) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("Stdin: end of input");
                break;
            },
            Ok(_) => {
                if line.chars().any(|c| tx.send(c).is_err()) {
                    break;
                }
            },
            Err(e) => {
                debug!("Stdin: read failed: {}", e);
                break;
            },
        }
    }
}
