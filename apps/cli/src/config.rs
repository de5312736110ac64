//! CLI 配置文件
//!
//! TOML 格式，时间单位均为毫秒：
//!
//! ```toml
//! [session]
//! command_poll_ms = 40
//! console_poll_ms = 10
//! heartbeat = true
//!
//! [simulator]
//! data_period_ms = 100
//! heartbeat_timeout_ms = 1000   # 0 表示不检查
//! disconnect_after_ms = 0        # 0 表示不断开
//! ```
//!
//! 文件不存在时使用默认值；文件中缺失的字段同样取默认值。

use anyhow::{Context, Result};
use rlink_device::SimConfig;
use rlink_driver::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件路径（`<config_dir>/rlink/config.toml`）
pub fn default_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Cannot determine the config directory")?;
    path.push("rlink");
    path.push("config.toml");
    Ok(path)
}

/// 解析配置文件路径（命令行优先）
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

/// 会话参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub command_poll_ms: u64,
    pub console_poll_ms: u64,
    /// 启动时心跳是否开启
    pub heartbeat: bool,
    pub startup_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub line_limit: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSection {
    fn from(config: &SessionConfig) -> Self {
        Self {
            command_poll_ms: millis(config.command_poll),
            console_poll_ms: millis(config.console_poll),
            heartbeat: config.heartbeat_on_start,
            startup_timeout_ms: millis(config.startup_timeout),
            shutdown_timeout_ms: millis(config.shutdown_timeout),
            line_limit: config.line_limit,
        }
    }
}

/// 模拟设备参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSection {
    pub data_period_ms: u64,
    /// 设备端心跳超时（0 表示不检查）
    pub heartbeat_timeout_ms: u64,
    /// 打开后多久模拟断开（0 表示不断开）
    pub disconnect_after_ms: u64,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        let sim = SimConfig::default();
        Self {
            data_period_ms: millis(sim.data_period),
            heartbeat_timeout_ms: sim.heartbeat_timeout.map_or(0, millis),
            disconnect_after_ms: sim.disconnect_after.map_or(0, millis),
        }
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session: SessionSection,
    pub simulator: SimulatorSection,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 0 表示关闭
pub fn optional_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认值）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// 保存配置（自动创建目录）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn session_config(&self) -> SessionConfig {
        let s = &self.session;
        SessionConfig {
            command_poll: Duration::from_millis(s.command_poll_ms),
            console_poll: Duration::from_millis(s.console_poll_ms),
            heartbeat_on_start: s.heartbeat,
            startup_timeout: Duration::from_millis(s.startup_timeout_ms),
            shutdown_timeout: Duration::from_millis(s.shutdown_timeout_ms),
            line_limit: s.line_limit,
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulator;
        SimConfig {
            data_period: Duration::from_millis(s.data_period_ms),
            heartbeat_timeout: optional_millis(s.heartbeat_timeout_ms),
            disconnect_after: optional_millis(s.disconnect_after_ms),
        }
    }
}
