use anyhow::Context as _;
use clap::Parser;
use rest_storage::config::cli::Command;
use rest_storage::utils::logger;
use rest_storage::{CliConfig, Context, ErrorKind, Storage, StorageError};
use std::io::Write;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        let exit_code = match e.downcast_ref::<StorageError>() {
            Some(storage_error) => {
                eprintln!("❌ {}", storage_error.user_friendly_message());
                match storage_error.kind() {
                    ErrorKind::NotFound => 2,
                    ErrorKind::Configuration => 3,
                    ErrorKind::Cancelled => 4,
                    _ => 1,
                }
            }
            None => {
                eprintln!("❌ {:#}", e);
                1
            }
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let config = cli.storage_config()?;
    tracing::debug!("Storage config: {:?}", config);

    let storage = config.build()?;
    let ctx = Context::background();

    match cli.command {
        Command::Store { key, value, file } => {
            let data = match (value, file) {
                (Some(value), _) => value.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("either --value or --file is required"),
            };
            storage.store(&ctx, &key, &data).await?;
            tracing::info!("Stored {} bytes at {}", data.len(), key);
        }
        Command::Load { key, output } => {
            let data = storage.load(&ctx, &key).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &data)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("Saved {} bytes to {}", data.len(), path.display());
                }
                None => std::io::stdout().write_all(&data)?,
            }
        }
        Command::Delete { key } => {
            storage.delete(&ctx, &key).await?;
            tracing::info!("Deleted {}", key);
        }
        Command::Exists { key } => {
            let exists = storage.exists(&ctx, &key).await;
            println!("{}", exists);
        }
        Command::List { prefix, recursive } => {
            for key in storage.list(&ctx, &prefix, recursive).await? {
                println!("{}", key);
            }
        }
        Command::Stat { key } => {
            let info = storage.stat(&ctx, &key).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Lock { key, wait } => {
            let ctx = ctx.child_with_timeout(Duration::from_secs(wait));
            storage.lock(&ctx, &key).await?;
            println!("🔒 Acquired lock {}", key);
        }
        Command::Unlock { key } => {
            storage.unlock(&ctx, &key).await?;
            println!("🔓 Released lock {}", key);
        }
    }

    Ok(())
}
