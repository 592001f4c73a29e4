use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hdfs_blobstore::config;
use hdfs_blobstore::storage::{RequestContext, StorageDriver, StorageManager};

const USAGE: &str = "usage: hdfs-blobstore <command> [args]

commands:
  info                      show the configured driver type and its options
  ls [path]                 list direct children (default /)
  stat <path>               show object metadata
  cat <path> [offset]       write the object to stdout, starting at offset
  put <path> <file>         store a local file, replacing the object
  append <path> <file>      append a local file to the object
  mv <source> <dest>        move an object
  rm <path>                 delete an object recursively
  url <path>                request a direct download URL";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{}>\n\n{}", name, USAGE))
}

/// Execute one command against the driver / 执行命令
async fn run(command: &str, args: &[String], driver: &dyn StorageDriver, ctx: &RequestContext) -> Result<()> {
    match command {
        "ls" => {
            let path = args.first().map(String::as_str).unwrap_or("/");
            for child in driver.list(ctx, path).await? {
                println!("{}", child);
            }
        }
        "stat" => {
            let info = driver.stat(ctx, arg(args, 0, "path")?).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        "cat" => {
            let path = arg(args, 0, "path")?;
            let offset = match args.get(1) {
                Some(raw) => raw.parse::<u64>().with_context(|| format!("invalid offset: {}", raw))?,
                None => 0,
            };
            let mut reader = driver.reader(ctx, path, offset).await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }
        "put" => {
            let path = arg(args, 0, "path")?;
            let local = arg(args, 1, "file")?;
            let content = tokio::fs::read(local)
                .await
                .with_context(|| format!("failed to read {}", local))?;
            driver.put_content(ctx, path, &content).await?;
            println!("{} bytes written to {}", content.len(), path);
        }
        "append" => {
            let path = arg(args, 0, "path")?;
            let local = arg(args, 1, "file")?;
            let mut file = tokio::fs::File::open(local)
                .await
                .with_context(|| format!("failed to open {}", local))?;

            let mut writer = driver.writer(ctx, path, true).await?;
            let mut buf = vec![0u8; COPY_BUFFER_SIZE];
            loop {
                let n = match file.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        writer.close().await?;
                        return Err(e).with_context(|| format!("failed to read {}", local));
                    }
                };
                if let Err(e) = writer.write(&buf[..n]).await {
                    writer.close().await?;
                    return Err(e.into());
                }
            }
            writer.commit().await?;
            writer.close().await?;
            println!("{} is now {} bytes", path, writer.size());
        }
        "mv" => {
            driver
                .move_item(ctx, arg(args, 0, "source")?, arg(args, 1, "dest")?)
                .await?;
        }
        "rm" => {
            driver.delete(ctx, arg(args, 0, "path")?).await?;
        }
        "url" => {
            let url = driver
                .url_for(ctx, arg(args, 0, "path")?, &serde_json::Map::new())
                .await?;
            println!("{}", url);
        }
        other => bail!("unknown command: {}\n\n{}", other, USAGE),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration / 加载配置
    let loaded = config::load_config().map_err(|e| anyhow!(e))?;
    let app_config = loaded.config;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| app_config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        "hdfs-blobstore {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME")
    );
    if loaded.created {
        tracing::info!("Created default configuration at {:?}", loaded.path);
    } else {
        tracing::info!("Loaded configuration from {:?}", loaded.path);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let storage_manager = StorageManager::new();

    // Register all storage driver factories / 注册所有存储驱动工厂
    hdfs_blobstore::register_storage_drivers(&storage_manager).await?;

    let storage = &app_config.storage;
    if command == "info" {
        let info = storage_manager
            .driver_info(&storage.driver_type)
            .await
            .ok_or_else(|| anyhow!("Driver type not found: {}", storage.driver_type))?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let id = storage_manager
        .create_driver(storage.id.clone(), &storage.driver_type, storage.config.clone())
        .await?;
    if let Some(err) = storage_manager.get_driver_error(&id).await {
        tracing::warn!("Driver {} is degraded: {}", id, err);
    }
    let driver = storage_manager
        .get_driver(&id)
        .await
        .ok_or_else(|| anyhow!("Driver not found: {}", id))?;

    // Ctrl-C cancels the in-flight request / Ctrl-C 取消当前请求
    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling request");
                token.cancel();
            }
        }
    });
    let ctx = RequestContext::with_token(token).with_request_id(format!("cli-{}", std::process::id()));

    run(command, &args[1..], &**driver, &ctx).await
}
