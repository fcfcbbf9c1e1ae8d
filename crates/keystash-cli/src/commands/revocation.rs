use anyhow::Result;
use colored::Colorize;
use keystash_cache::{RevocationList, revocation_key};

use crate::output::print_success;

pub async fn list(revocations: &RevocationList, prefix: &str) -> Result<()> {
    let ids = revocations.keys(prefix).await?;
    if ids.is_empty() {
        println!("No entries recorded under {}.", revocation_key(prefix).cyan());
        return Ok(());
    }
    for id in &ids {
        println!("{id}");
    }
    println!("Total: {}", ids.len());
    Ok(())
}

pub async fn revoke(revocations: &RevocationList, prefix: &str) -> Result<()> {
    let revoked = revocations.revoke(prefix).await?;
    print_success(&format!("Revoked {revoked} entries under prefix {prefix}"));
    Ok(())
}
