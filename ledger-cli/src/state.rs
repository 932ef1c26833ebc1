use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `~/.neon-ledger`, holding config.toml, auth.json and the journal.
pub fn ledger_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".neon-ledger"))
}

pub fn ensure_ledger_home() -> Result<PathBuf> {
    let dir = ledger_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
