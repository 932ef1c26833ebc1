use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::llm::Provider;
use crate::state::ensure_ledger_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_ledger_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth_to(p: &Path, auth: &AuthState) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Environment first, then auth.json. `env` is `std::env::var` in
/// production and a closure in tests.
pub fn resolve_api_key(
    provider: Provider,
    auth: &AuthState,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    const GEMINI_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];
    const OPENAI_VARS: &[&str] = &["OPENAI_API_KEY"];

    let (vars, stored) = match provider {
        Provider::Gemini => (GEMINI_VARS, &auth.gemini_api_key),
        Provider::OpenAI => (OPENAI_VARS, &auth.openai_api_key),
    };

    vars.iter()
        .filter_map(|&v| env(v))
        .chain(stored.iter().cloned())
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_gemini_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste Gemini API key (starts with AIza)")?;
    if !key.starts_with("AIza") {
        bail!("key didn't look like a Gemini API key (expected prefix AIza)");
    }
    auth.gemini_api_key = Some(key);
    save_auth_to(&p, &auth)?;
    println!("Saved Gemini API key to {}", p.display());
    Ok(())
}

pub fn paste_openai_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth_to(&p, &auth)?;
    println!("Saved OpenAI API key to {}", p.display());
    Ok(())
}
