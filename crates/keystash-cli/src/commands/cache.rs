use std::time::Duration;

use anyhow::{Result, bail};
use keystash_cache::{ABSENT, CacheClient};

use crate::cli::CacheCommands;
use crate::output::{print_field, print_success};

pub async fn run(client: &dyn CacheClient, command: &CacheCommands) -> Result<()> {
    match command {
        CacheCommands::Get(args) => {
            let value = client.get(&args.key).await?;
            print_field(&args.key, &describe(value.as_deref()));
        }
        CacheCommands::Set(args) => {
            client
                .set(&args.key, args.value.as_bytes(), Duration::from_secs(args.ttl))
                .await?;
            print_success(&format!("Stored {}", args.key));
        }
        CacheCommands::Add(args) => {
            let added = client
                .add(&args.key, args.value.as_bytes(), Duration::from_secs(args.ttl))
                .await?;
            if !added {
                bail!("Key {} already exists", args.key);
            }
            print_success(&format!("Added {}", args.key));
        }
        CacheCommands::Incr(args) => match client.incr(&args.key, args.delta).await? {
            Some(value) => print_field(&args.key, &value.to_string()),
            None => bail!("Key {} does not exist", args.key),
        },
        CacheCommands::Delete(args) => {
            client.delete(&args.key).await?;
            print_success(&format!("Deleted {}", args.key));
        }
    }
    Ok(())
}

/// Human-readable form of a raw cached value.
pub fn describe(value: Option<&[u8]>) -> String {
    match value {
        None => "(not set)".to_string(),
        Some(bytes) if bytes == ABSENT => "(cached absence)".to_string(),
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => format!("({} bytes of binary data)", bytes.len()),
        },
    }
}
