//! zencode terminal front end.
//!
//! Drives an editor session from a line REPL: switch languages, edit, tune
//! font and theme, sign in, and ask the assistant about the current code.
//!
//! Usage:
//!   # Defaults: ~/.config/zencode/config.toml, GEMINI_API_KEY, CONVEX_URL
//!   cargo run -p zencode-cli
//!
//!   # Sign in up front and start in Rust
//!   cargo run -p zencode-cli -- --identity user_2abc --language rust
//!
//! Logs go to stderr; `RUST_LOG=zencode_kernel=debug` shows session internals.

mod repl;
mod surface;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use zencode_kernel::{EditorSession, ZencodeConfig};
use zencode_types::{IdentityId, Language};

use crate::surface::TerminalSurface;

/// Terminal front end for the zencode editor session.
#[derive(Parser, Debug)]
#[command(name = "zencode")]
#[command(about = "Code editor session with AI assist, in your terminal")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/zencode/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sign in as this identity at startup
    #[arg(short, long)]
    identity: Option<String>,

    /// Language to open instead of the last one used
    #[arg(short, long)]
    language: Option<Language>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _telemetry = zencode_telemetry::init("zencode-cli", &args.log_filter);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "zencode exited with an error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ZencodeConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ZencodeConfig::load_default().await.context("loading config")?,
    };

    let store = config.open_store().await;
    let assist = config
        .build_coordinator()
        .context("setting up the assist provider")?;
    let resolver = config.build_resolver();

    let session = EditorSession::open(store, resolver, assist, Arc::new(TerminalSurface))
        .await
        .with_checkout_url(config.billing.checkout_url.clone());
    let session = Arc::new(session);

    // No browser identity provider here: auth is "loaded" once we start.
    session.set_auth_loaded(true);
    session.mount().await;
    if let Some(language) = args.language {
        session.select_language(language).await;
    }
    if let Some(identity) = args.identity {
        repl::spawn_login(session.clone(), IdentityId::new(identity));
    }

    println!("zencode: type `help` for commands");
    repl::run(session).await
}
