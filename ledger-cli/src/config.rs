use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::Provider;
use crate::state::ensure_ledger_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub ledger: LedgerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "gemini" or "openai"
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// IANA zone used to decide "today" for relative deadlines.
    pub timezone: String,
    /// Append commands and replies to ~/.neon-ledger/journal/YYYY-MM-DD.md
    pub journal: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.4,
            timeout_secs: 60,
        }
    }
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            journal: true,
        }
    }
}

impl Config {
    pub fn provider(&self) -> Result<Provider> {
        match self.llm.provider.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            other => bail!("unknown llm.provider '{other}' (expected gemini or openai)"),
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.ledger
            .timezone
            .parse()
            .map_err(|_| anyhow!("invalid ledger.timezone: {}", self.ledger.timezone))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_ledger_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Accept `models/gemini-…` and `openai/gpt-…` style names and return the
/// bare model id the APIs expect.
pub fn normalize_model(model: &str) -> String {
    let m = model.trim();
    m.strip_prefix("models/")
        .or_else(|| m.strip_prefix("openai/"))
        .unwrap_or(m)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.provider().unwrap(), Provider::Gemini);
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            "[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n\n[ledger]\ntimezone = \"America/Chicago\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.provider().unwrap(), Provider::OpenAI);
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.timeout_secs, 60);
        assert!(cfg.ledger.journal);
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::America::Chicago);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.ledger.journal = false;
        cfg.llm.timeout_secs = 5;
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn test_bad_values_are_reported() {
        let mut cfg = Config::default();
        cfg.llm.provider = "mystery".to_string();
        cfg.ledger.timezone = "Mars/Olympus".to_string();
        assert!(cfg.provider().is_err());
        assert!(cfg.timezone().is_err());
    }

    #[test]
    fn test_normalize_model() {
        assert_eq!(normalize_model("models/gemini-3-flash-preview"), "gemini-3-flash-preview");
        assert_eq!(normalize_model("openai/gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(normalize_model("gpt-4o-mini"), "gpt-4o-mini");
    }
}
