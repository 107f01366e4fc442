mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

use chreg::config::Config;
use chreg::handlers::{Field, HandlerRecord, Registry};
use chreg::observability::init_tracing;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };
    init_tracing(&config.telemetry.log_filter);

    match cli.command {
        Commands::Serve(args) => {
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            chreg::api::run(config).await?;
        }
        Commands::List => {
            let registry = open_registry(&config).await?;
            for record in registry.list().await {
                println!("{}", summary(&record));
            }
            registry.close().await?;
        }
        Commands::Find(args) => {
            let field: Field = args.field.parse()?;
            let registry = open_registry(&config).await?;
            for record in registry.find_handler(&args.caller, field, &args.value).await? {
                println!("{}", summary(&record));
            }
            registry.close().await?;
        }
        Commands::Conflicts(args) => {
            let registry = open_registry(&config).await?;
            for record in registry.find_conflicted(&args.id).await {
                println!("{}", summary(&record));
            }
            registry.close().await?;
        }
        Commands::Register(args) => {
            let record = read_record(&args.file)?;
            let registry = open_registry(&config).await?;
            let registered = registry.register(record).await?;
            info!(id = %registered.id, "Handler registered");
            registry.close().await?;
        }
        Commands::Unregister(args) => {
            let registry = open_registry(&config).await?;
            let removed = registry.unregister(&args.id).await?;
            registry.close().await?;
            if !removed {
                return Err(format!("handler {} is not registered", args.id).into());
            }
        }
    }

    Ok(())
}

async fn open_registry(config: &Config) -> Result<Registry, AnyError> {
    let store = config.store.open()?;
    Ok(Registry::open(store).await?)
}

fn read_record(path: &Path) -> Result<HandlerRecord, AnyError> {
    let content = std::fs::read_to_string(path)?;
    let record = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(record)
}

fn summary(record: &Arc<HandlerRecord>) -> String {
    format!(
        "{}\towner={:x}\tclass={}\ttypes={}\tsuffixes={}",
        record.id,
        record.owner_storage_id,
        record.class_name,
        record.types.join(","),
        record.suffixes.join(",")
    )
}
