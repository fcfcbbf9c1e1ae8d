use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keystash")]
#[command(about = "keystash CLI: inspect and revoke cached entries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./keystash.toml)
    #[arg(short, long, global = true, env = "KEYSTASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides logging.level from the configuration
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Raw operations against the configured cache backend
    Cache(CacheArgs),
    /// List key ids recorded for a prefix
    Revocations(PrefixArgs),
    /// Delete every cached entry recorded for a prefix
    Revoke(PrefixArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Read a key
    Get(KeyArgs),
    /// Store a value unconditionally
    Set(StoreArgs),
    /// Store a value only if the key is absent
    Add(StoreArgs),
    /// Increment an integer value
    Incr(IncrArgs),
    /// Remove a key
    Delete(KeyArgs),
}

#[derive(clap::Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(clap::Args)]
pub struct StoreArgs {
    pub key: String,
    pub value: String,
    /// Expiry in seconds, 0 never expires
    #[arg(long, default_value_t = 0)]
    pub ttl: u64,
}

#[derive(clap::Args)]
pub struct IncrArgs {
    pub key: String,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub delta: i64,
}

#[derive(clap::Args)]
pub struct PrefixArgs {
    /// Cache prefix (e.g. deleg)
    pub prefix: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}
