//! Interactive plan/action/observe agent loop.
//!
//! Reads queries at a `> ` prompt, lets a Gemini model work through them one
//! JSON step at a time, and runs the requested tools locally.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{debug, info};

use steploop::controller::{AgentLoop, ReplExit};
use steploop::core::types::DenialPolicy;
use steploop::exit_codes;
use steploop::gate::ConfirmationGate;
use steploop::io::config::{AgentConfig, DEFAULT_CONFIG_FILE, load_config};
use steploop::io::gemini::{GeminiChat, GeminiSettings};
use steploop::io::process::AttachedShell;
use steploop::io::prompt::render_system_prompt;
use steploop::io::terminal::StdioPrompter;
use steploop::logging;
use steploop::render::describe;
use steploop::tools::ToolRegistry;

#[derive(Parser)]
#[command(
    name = "steploop",
    version,
    about = "Interactive plan/action/observe agent loop"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Model id, overriding the config file.
    #[arg(long)]
    model: Option<String>,

    /// What answering `n` at a confirmation prompt does.
    #[arg(long, value_enum)]
    denial_policy: Option<DenialPolicy>,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    load_dotenv()?;
    let api_key = env::var(&config.api_key_env)
        .map_err(|_| anyhow!("missing API key: set {}", config.api_key_env))?;

    let cwd = env::current_dir().context("resolve process directory")?;
    let registry = ToolRegistry::builtin(AttachedShell);
    let system_prompt = render_system_prompt(&registry)?;
    let chat = GeminiChat::new(
        GeminiSettings {
            base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            api_key,
        },
        system_prompt,
    )?;

    info!(model = %config.model, policy = ?config.denial_policy, cwd = %cwd.display(), "starting session");
    let mut agent = AgentLoop::new(
        chat,
        StdioPrompter::stdio(),
        registry,
        ConfirmationGate::new(config.denial_policy),
        cwd,
    )
    .with_continuation(config.continuation_message)
    .with_step_limit(config.max_steps_per_turn);

    let exit = agent.run_repl(|event| println!("{}", describe(event)))?;
    Ok(match exit {
        ReplExit::Exit | ReplExit::EndOfInput => exit_codes::OK,
        ReplExit::Denied => exit_codes::DENIED,
    })
}

fn resolve_config(cli: &Cli) -> Result<AgentConfig> {
    let mut config =
        load_config(&cli.config).with_context(|| format!("load {}", cli.config.display()))?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(policy) = cli.denial_policy {
        config.denial_policy = policy;
    }
    config.validate()?;
    Ok(config)
}

/// Load `.env` from the process directory when present.
fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(anyhow!(err)).context("load .env"),
    }
}
