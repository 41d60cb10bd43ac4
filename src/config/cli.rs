use crate::config::StorageConfig;
use crate::utils::error::{Result, StorageError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "rest-storage")]
#[command(about = "Inspect and manage certificate storage kept in a remote key-value service")]
pub struct CliConfig {
    /// TOML file with endpoint, token and lock settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub token: Option<String>,

    /// Per-request transport timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store a value under a key
    Store {
        key: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        value: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print or save the value stored under a key
    Load {
        key: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Delete {
        key: String,
    },
    Exists {
        key: String,
    },
    /// List keys under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long)]
        recursive: bool,
    },
    Stat {
        key: String,
    },
    /// Acquire a lock, waiting at most `--wait` seconds
    Lock {
        key: String,
        #[arg(long, default_value = "60")]
        wait: u64,
    },
    Unlock {
        key: String,
    },
}

impl CliConfig {
    /// 設定來源優先順序: 命令列 > 環境變數 > 設定檔
    pub fn storage_config(&self) -> Result<StorageConfig> {
        let mut config = match &self.config {
            Some(path) => StorageConfig::from_file(path)?,
            None => StorageConfig::new(String::new(), String::new()),
        };

        config.apply_env_overrides()?;

        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_seconds = Some(timeout);
        }

        if config.endpoint.is_empty() && config.token.is_empty() && self.config.is_none() {
            return Err(StorageError::ConfigError {
                message: "no storage configured; pass --config or --endpoint/--token".to_string(),
            });
        }

        Ok(config)
    }
}
