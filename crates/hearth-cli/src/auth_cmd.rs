//! Auth subcommands: login, create, logout, status, apikey.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::apikey_cmd::{self, ApiKeyAction};
use crate::context::ClientContext;
use crate::credentials::{CredentialStore, ProfileStore, SecretKind};
use crate::gateway::is_server_running;
use crate::session::mask_token;

/// Auth subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum AuthAction {
    /// Log in with an existing account key.
    Login {
        /// Account key; prompted for when omitted.
        #[arg(long, env = "HEARTH_ACCOUNT_KEY", hide_env_values = true)]
        account_key: Option<String>,
        /// Wallet storage root.
        #[arg(long)]
        root_path: Option<String>,
        /// Account API listen address (`host:port`).
        #[arg(long)]
        listen_address: Option<String>,
    },
    /// Create a new account; prints the generated account key.
    Create {
        /// Account name.
        name: String,
        #[arg(long)]
        root_path: Option<String>,
        #[arg(long)]
        listen_address: Option<String>,
    },
    /// Stop the account, close the session and forget stored credentials.
    Logout,
    /// Show server, credential and account status.
    Status,
    /// Manage API keys for local apps.
    #[command(name = "apikey")]
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },
}

/// Execute an auth subcommand.
pub async fn run(action: AuthAction, ctx: &ClientContext) -> anyhow::Result<()> {
    match action {
        AuthAction::Login {
            account_key,
            root_path,
            listen_address,
        } => {
            let key = match account_key {
                Some(key) => key,
                None => prompt_account_key()?,
            };
            login(ctx, &key, root_path.as_deref(), listen_address.as_deref()).await
        }
        AuthAction::Create {
            name,
            root_path,
            listen_address,
        } => create(ctx, &name, root_path.as_deref(), listen_address.as_deref()).await,
        AuthAction::Logout => logout(ctx).await,
        AuthAction::Status => status(ctx).await,
        AuthAction::ApiKey { action } => apikey_cmd::run(action, ctx).await,
    }
}

fn prompt_account_key() -> anyhow::Result<String> {
    let mut out = io::stdout();
    write!(out, "Account key: ")?;
    out.flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read account key")?;
    Ok(line.trim().to_string())
}

async fn login(
    ctx: &ClientContext,
    account_key: &str,
    root_path: Option<&str>,
    listen_address: Option<&str>,
) -> anyhow::Result<()> {
    let session = ctx
        .orchestrator
        .login(account_key, root_path, listen_address)
        .await
        .context("Login failed")?;
    let mut out = io::stdout();
    writeln!(out, "Logged in to account {}", session.account_id)?;
    Ok(())
}

async fn create(
    ctx: &ClientContext,
    name: &str,
    root_path: Option<&str>,
    listen_address: Option<&str>,
) -> anyhow::Result<()> {
    let (session, credential) = ctx
        .orchestrator
        .create_session(name, root_path, listen_address)
        .await
        .context("Account creation failed")?;
    let mut out = io::stdout();
    writeln!(out, "Created account {}", session.account_id)?;
    writeln!(out)?;
    writeln!(out, "Account key (keep it safe, it is the only way back in):")?;
    writeln!(out, "  {}", credential.account_key)?;
    Ok(())
}

async fn logout(ctx: &ClientContext) -> anyhow::Result<()> {
    ctx.orchestrator.logout().await.context("Logout failed")?;
    let mut out = io::stdout();
    writeln!(out, "Logged out")?;
    Ok(())
}

/// What `auth status` reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub server_running: bool,
    pub has_account_key: bool,
    pub token: Option<String>,
    pub account_id: Option<String>,
}

impl StatusReport {
    fn has_credentials(&self) -> bool {
        self.has_account_key || self.token.is_some() || self.account_id.is_some()
    }

    /// A stored token is only live while the server runs.
    pub fn logged_in(&self) -> bool {
        self.server_running && self.token.is_some()
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        if !self.server_running {
            writeln!(out, "Server is not running. Run `hearth serve` to start it.")?;
            if self.has_credentials() {
                writeln!(out, "Credentials are stored.")?;
            }
            return Ok(());
        }
        if !self.has_credentials() {
            writeln!(
                out,
                "Not authenticated. Run `hearth auth login` or `hearth auth create`."
            )?;
            return Ok(());
        }

        writeln!(out, "hearth")?;
        match (&self.account_id, self.logged_in()) {
            (Some(id), true) => writeln!(out, "  Logged in to account {id}")?,
            _ => writeln!(out, "  Not logged in (credentials stored)")?,
        }
        writeln!(out, "  Active session: {}", self.logged_in())?;
        if self.has_account_key {
            writeln!(out, "  Account key: stored")?;
        }
        if let Some(token) = &self.token {
            writeln!(out, "  Token: {}", mask_token(token))?;
        }
        Ok(())
    }
}

async fn status(ctx: &ClientContext) -> anyhow::Result<()> {
    let token = ctx
        .profile
        .get(SecretKind::SessionToken)?
        .map(|(token, _)| token);
    let report = StatusReport {
        server_running: is_server_running(ctx.gateway()).await.unwrap_or(false),
        has_account_key: ctx.profile.get(SecretKind::AccountKey)?.is_some(),
        token,
        account_id: ctx.profile.account_id(),
    };
    report.render(&mut io::stdout())?;
    Ok(())
}
