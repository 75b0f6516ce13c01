//! Hearth CLI
//!
//! Logs in to the hearth account service, manages spaces and runs the
//! service in the foreground.

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tracing::debug;

use hearth_cli::auth_cmd::{self, AuthAction};
use hearth_cli::config::ConfigManager;
use hearth_cli::config_cmd::{self, ConfigAction};
use hearth_cli::context::ClientContext;
use hearth_cli::serve_cmd::{self, ServeArgs};
use hearth_cli::space_cmd::{self, SpaceAction};

#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(version, about = "Hearth account service CLI", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Log level for hearth crates (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground.
    #[command(alias = "start")]
    Serve(ServeArgs),
    /// Log in, create an account, log out, show status, manage API keys.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// List, join, leave and approve spaces.
    Space {
        #[command(subcommand)]
        action: SpaceAction,
    },
    /// Read and write the local profile.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show client and server versions.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = hearth_core::config::load_settings()?;
    if let Some(level) = &cli.log_level {
        settings.log_level.clone_from(level);
    }
    hearth_core::tracing_init::init_tracing(
        &hearth_core::tracing_init::default_filter(&settings.log_level),
        cli.log_json,
    );
    debug!(version = env!("CARGO_PKG_VERSION"), "Starting hearth");

    match cli.command {
        Command::Serve(args) => serve_cmd::run(args, settings).await,
        Command::Auth { action } => {
            let ctx = ClientContext::build(settings)?;
            auth_cmd::run(action, &ctx).await
        }
        Command::Space { action } => {
            let ctx = ClientContext::build(settings)?;
            space_cmd::run(action, &ctx).await
        }
        Command::Config { action } => {
            let profile = ConfigManager::open_default()?;
            config_cmd::run(action, &profile)
        }
        Command::Version => version(settings).await,
    }
}

async fn version(settings: hearth_core::Settings) -> anyhow::Result<()> {
    let ctx = ClientContext::build(settings)?;
    let mut out = io::stdout();
    writeln!(out, "hearth {}", env!("CARGO_PKG_VERSION"))?;
    match ctx.gateway().app_version().await {
        Ok(server) => writeln!(out, "server {server}")?,
        Err(e) if e.is_connection() || e.is_timeout() => writeln!(out, "server not running")?,
        Err(e) => writeln!(out, "server version unavailable: {e}")?,
    }
    Ok(())
}
