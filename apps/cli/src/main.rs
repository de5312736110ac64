//! # rlink CLI
//!
//! 在模拟的 rlink 设备上运行交互式轮椅控制台。
//!
//! ```bash
//! # 交互模式：按提示输入动作编号
//! rlink-cli run
//!
//! # 脚本模式：上、上、右、喇叭、退出
//! rlink-cli run --script 0,0,3,12,19
//!
//! # 配置管理
//! rlink-cli config init
//! rlink-cli config show
//! ```
//!
//! 日志写到 stderr（`RUST_LOG` 可覆盖默认过滤器），菜单和转储写到 stdout。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod input;

use commands::{ConfigCommand, RunCommand};
use config::CliConfig;

const DEFAULT_LOG_FILTER: &str = "rlink_cli=info,rlink_driver=info,rlink_device=info";

/// rlink 控制台命令行工具
#[derive(Parser, Debug)]
#[command(name = "rlink-cli")]
#[command(about = "Interactive console for rlink wheelchair sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/rlink/config.toml）
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行控制台会话
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let path = config::resolve_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { args } => {
            let config = CliConfig::load(&path)?;
            args.execute(config)
        },
        Commands::Config(cmd) => cmd.execute(&path),
    }
}
