//! run 命令
//!
//! 在模拟设备上运行一次控制台会话。

use crate::config::{CliConfig, optional_millis};
use crate::input::spawn_stdin_reader;
use anyhow::{Context, Result, bail};
use clap::Args;
use rlink_device::{Link, SimulatedLink};
use rlink_driver::{Action, ScriptedInput, SessionReport, ShutdownReason, Supervisor};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 会话运行参数
#[derive(Args, Debug, Default)]
pub struct RunCommand {
    /// 动作脚本（逗号或空白分隔的动作编号，如 "0,0,3,12,19"），代替标准输入
    #[arg(short, long)]
    pub script: Option<String>,

    /// 启动时关闭心跳
    #[arg(long)]
    pub no_heartbeat: bool,

    /// 模拟设备在打开后多久断开（毫秒）
    #[arg(long, value_name = "MS")]
    pub disconnect_after_ms: Option<u64>,

    /// 模拟设备的 DATA_READY 周期（毫秒）
    #[arg(long, value_name = "MS")]
    pub data_period_ms: Option<u64>,
}

/// 解析动作脚本，返回逐行输入文本
pub fn parse_script(script: &str) -> Result<String> {
    let mut lines = String::new();
    for token in script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let action =
            Action::parse(token).with_context(|| format!("Invalid action in script: {token:?}"))?;
        lines.push_str(&format!("{}\n", u8::from(action)));
    }
    Ok(lines)
}

impl RunCommand {
    /// 把命令行参数叠加到配置上
    pub fn apply_overrides(&self, config: &mut CliConfig) {
        if self.no_heartbeat {
            config.session.heartbeat = false;
        }
        if let Some(ms) = self.disconnect_after_ms {
            config.simulator.disconnect_after_ms = ms;
        }
        if let Some(ms) = self.data_period_ms {
            config.simulator.data_period_ms = ms;
        }
    }

    pub fn execute(&self, mut config: CliConfig) -> Result<()> {
        self.apply_overrides(&mut config);
        let session_config = config.session_config();
        let sim_config = config.sim_config();
        if sim_config.data_period == Duration::ZERO {
            bail!("data_period_ms must be non-zero");
        }
        info!(
            "Simulated device: data every {:?}, heartbeat timeout {:?}, disconnect after {:?}",
            sim_config.data_period,
            sim_config.heartbeat_timeout,
            optional_millis(config.simulator.disconnect_after_ms)
        );

        let link = Arc::new(SimulatedLink::new(sim_config));
        link.open().context("Failed to open the simulated link")?;

        let supervisor = Supervisor::new(link.clone())
            .config(session_config)
            .output(io::stdout());
        let supervisor = match &self.script {
            Some(script) => supervisor.input(ScriptedInput::new(&parse_script(script)?)),
            None => supervisor.input(spawn_stdin_reader()?),
        };

        let quit = supervisor.quit_handle();
        ctrlc::set_handler(move || quit.quit()).context("Failed to install Ctrl-C handler")?;

        let result = supervisor.run();
        link.close().context("Failed to close the simulated link")?;
        let report = result.context("Session failed")?;

        print_report(&report);
        match report.reason {
            ShutdownReason::UserQuit | ShutdownReason::LinkDisconnected => Ok(()),
            reason => bail!("Session ended abnormally: {reason}"),
        }
    }
}

fn print_report(report: &SessionReport) {
    let m = &report.metrics;
    println!();
    println!("Session ended: {}", report.reason);
    println!(
        "  commands sent: {} (failed {}, {:.1}%)",
        m.commands_sent,
        m.command_failures,
        m.command_failure_rate()
    );
    println!(
        "  heartbeats:    {} (failed {})",
        m.heartbeats_sent, m.heartbeat_failures
    );
    println!(
        "  telemetry:     {} cycles (failed reads {})",
        m.telemetry_cycles, m.telemetry_failures
    );
    println!(
        "  console:       {} actions, {} invalid inputs",
        m.actions_executed, m.invalid_inputs
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_accepts_mixed_separators() {
        let lines = parse_script("0,0 3\t12, quit").unwrap();
        assert_eq!(lines, "0\n0\n3\n12\n19\n");
    }

    #[test]
    fn test_parse_script_rejects_unknown_action() {
        let err = parse_script("0,42").unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_overrides_applied() {
        let cmd = RunCommand {
            no_heartbeat: true,
            disconnect_after_ms: Some(250),
            data_period_ms: Some(20),
            ..Default::default()
        };
        let mut config = CliConfig::default();
        cmd.apply_overrides(&mut config);

        assert!(!config.session.heartbeat);
        assert_eq!(
            config.sim_config().disconnect_after,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.sim_config().data_period, Duration::from_millis(20));
    }
}
