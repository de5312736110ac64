//! 配置管理命令

use crate::config::CliConfig;
use anyhow::{Result, bail};
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置（TOML）
    Show,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = CliConfig::load(path)?;
                print!("{}", config.to_toml()?);
            },

            ConfigCommand::Init { force } => {
                if path.exists() && !force {
                    bail!(
                        "Config file {} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                CliConfig::default().save(path)?;
                println!("Wrote default config to {}", path.display());
            },

            ConfigCommand::Path => {
                println!("{}", path.display());
            },
        }
        Ok(())
    }
}
