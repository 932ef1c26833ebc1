use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ledger_core::{Dispatcher, Ledger, TaskStore, seed_tasks};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod journal;
mod llm;
mod shell;
mod state;

use crate::llm::{HttpInterpreter, LlmConfig};

#[derive(Parser, Debug)]
#[command(
    name = "neon-ledger",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("NEON_LEDGER_BUILD_SHA"), ")"),
    about = "Neon Ledger: gamified task ledger driven by natural-language directives"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive shell (default)
    Shell,

    /// Send one directive against the seed ledger and print the result
    Run {
        /// The directive, e.g. "Add a task to review Q3 dividends by Monday"
        #[arg(required = true, num_args = 1..)]
        directive: Vec<String>,
    },

    /// Print the rank ladder
    Ranks,

    /// Manage ~/.neon-ledger/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys in ~/.neon-ledger/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste a Gemini API key (GEMINI_API_KEY / API_KEY take precedence)
    PasteGeminiKey,
    /// Paste an OpenAI API key (OPENAI_API_KEY takes precedence)
    PasteOpenaiKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let cfg = config::load_config()?;
            let ledger = build_ledger(&cfg)?;
            let journal = if cfg.ledger.journal {
                Some(journal::Journal::open(&state::ensure_ledger_home()?)?)
            } else {
                None
            };
            shell::run_shell(ledger, journal).await?;
        }

        Command::Run { directive } => {
            let cfg = config::load_config()?;
            let mut ledger = build_ledger(&cfg)?;
            let directive = directive.join(" ");

            let msg = match ledger.submit(&directive).await {
                Ok(msg) => msg.to_string(),
                Err(e) => bail!("{} ({e})", e.user_message()),
            };

            println!("> {msg}\n");
            println!("{}", shell::render_list(ledger.store().tasks(), ledger.today()));
            println!("\n{}", shell::render_rank(&ledger.rank_progress()));
        }

        Command::Ranks => {
            println!("{}", shell::render_ranks_table());
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                let s = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("# {}\n{}", config::config_path()?.display(), s);
            }
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteGeminiKey => auth::paste_gemini_key()?,
            AuthCommand::PasteOpenaiKey => auth::paste_openai_key()?,
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Seed ledger wired to the configured provider. The API key is resolved
/// here and handed to the interpreter; nothing downstream reads the
/// environment.
fn build_ledger(cfg: &config::Config) -> Result<Ledger> {
    let provider = cfg.provider()?;
    let tz = cfg.timezone()?;
    let auth = auth::load_auth()?;
    let api_key = auth::resolve_api_key(provider, &auth, |k| std::env::var(k).ok());
    if api_key.is_none() {
        tracing::warn!(
            provider = provider.label(),
            "no API key configured; directives will fail until one is added"
        );
    }

    let interpreter = HttpInterpreter::new(LlmConfig::from_config(cfg, api_key)?)
        .context("build http client")?;
    let dispatcher = Dispatcher::new(interpreter, tz);
    let store = TaskStore::new(seed_tasks(dispatcher.today()));
    Ok(Ledger::new(store, dispatcher))
}
