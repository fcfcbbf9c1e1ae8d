mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use keystash_cache::{BackendResolver, RevocationList, SharedClient};

use cli::{Cli, Commands, ConfigCommands};
use config::AppConfig;
use output::{print_error, print_field};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level("warn");

    let config = config::loader::load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    observability::apply_logging_level(cli.log_level.as_deref().unwrap_or(&config.logging.level));
    tracing::debug!(config = ?config.redacted(), "Configuration loaded");

    match &cli.command {
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => {
                print_field(
                    "Config file",
                    &cli
                        .config
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| config::DEFAULT_CONFIG_FILE.to_string()),
                );
                println!("{}", toml::to_string_pretty(&config.redacted())?);
            }
        },
        Commands::Cache(args) => {
            let client = connect(&config)?;
            commands::cache::run(client.as_ref(), &args.command).await?;
        }
        Commands::Revocations(args) => {
            let revocations = RevocationList::new(connect(&config)?);
            commands::revocation::list(&revocations, &args.prefix).await?;
        }
        Commands::Revoke(args) => {
            let revocations = RevocationList::new(connect(&config)?);
            commands::revocation::revoke(&revocations, &args.prefix).await?;
        }
    }

    Ok(())
}

/// Resolve the configured external backend.
///
/// The in-process fallback store lives only as long as one CLI invocation,
/// so a value written by `cache set` would be gone by the next command.
/// Commands therefore require `cache.servers`.
fn connect(config: &AppConfig) -> Result<SharedClient> {
    if config.cache.backend_address().is_none() {
        if config.cache.in_memory_fallback {
            bail!(
                "cache.servers is not set: the in-memory fallback does not persist between \
                 keystash invocations, so there is nothing to inspect"
            );
        }
        bail!("Caching is disabled: set cache.servers");
    }
    let client = BackendResolver::new(config.cache.clone())
        .client()
        .ok_or_else(|| anyhow!("Failed to create a client for cache.servers"))?;
    tracing::debug!(backend = client.name(), "Connected to cache backend");
    Ok(client)
}
