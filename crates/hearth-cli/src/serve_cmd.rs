//! `hearth serve`: run the server in the foreground and log in unattended.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hearth_core::Settings;

use crate::context::ClientContext;
use crate::session::{RecoveryOutcome, RetryPolicy, TokioSleeper};
use crate::tasks::{SERVER_TASK, ServerTask, TaskSupervisor};

/// Supervisor name of the unattended login task.
pub const AUTO_LOGIN_TASK: &str = "auto-login";

#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Account API listen address (`host:port`).
    #[arg(long)]
    pub listen_address: Option<String>,
    /// gRPC address the server binds.
    #[arg(long)]
    pub grpc_address: Option<String>,
    /// Server binary.
    #[arg(long)]
    pub server_bin: Option<PathBuf>,
    /// Skip logging in with the stored account key.
    #[arg(long)]
    pub no_auto_login: bool,
}

impl ServeArgs {
    /// Flags are the last settings layer.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(addr) = &self.listen_address {
            settings.server.api_address.clone_from(addr);
        }
        if let Some(addr) = &self.grpc_address {
            settings.server.grpc_address.clone_from(addr);
        }
        if let Some(bin) = &self.server_bin {
            settings.server.binary = Some(bin.clone());
        }
        if self.no_auto_login {
            settings.auto_login.enabled = false;
        }
    }
}

pub async fn run(args: ServeArgs, mut settings: Settings) -> anyhow::Result<()> {
    args.apply(&mut settings);
    let ctx = Arc::new(ClientContext::build_batch(settings)?);
    let supervisor = TaskSupervisor::new();

    let server = ServerTask::from_settings(&ctx.settings);
    supervisor.start(SERVER_TASK, move |cancel| server.run(cancel))?;

    if ctx.settings.auto_login.enabled {
        let ctx = Arc::clone(&ctx);
        supervisor.start(AUTO_LOGIN_TASK, move |cancel| auto_login(ctx, cancel))?;
    }

    wait_for_shutdown(&supervisor).await?;

    ctx.shutdown.cancel();
    ctx.orchestrator.events().close().await;
    supervisor.stop_all().await;
    info!("Stopped");
    Ok(())
}

async fn auto_login(ctx: Arc<ClientContext>, cancel: CancellationToken) -> anyhow::Result<()> {
    let delay = Duration::from_millis(ctx.settings.auto_login.startup_delay_ms);
    tokio::select! {
        () = cancel.cancelled() => return Ok(()),
        () = tokio::time::sleep(delay) => {}
    }

    let policy = RetryPolicy::from_settings(&ctx.settings.auto_login);
    let listen = ctx.settings.server.api_address.clone();
    tokio::select! {
        () = cancel.cancelled() => {}
        outcome = ctx.orchestrator.auto_recover_stored(Some(&listen), &policy, &TokioSleeper) => {
            match outcome {
                RecoveryOutcome::Recovered(session) => {
                    info!(account_id = %session.account_id, "Logged in with stored account key");
                }
                RecoveryOutcome::NoStoredCredential => {
                    info!("No stored account key, run `hearth auth login` to log in");
                }
                RecoveryOutcome::GaveUp { attempts, last_error } => {
                    warn!(attempts, error = %last_error, "Auto-login gave up");
                }
            }
        }
    }
    Ok(())
}

/// Block until Ctrl+C, SIGTERM, or the server task exiting on its own.
async fn wait_for_shutdown(supervisor: &TaskSupervisor) -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    info!("Serving, press Ctrl+C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
        _ = sigterm_future => {
            info!("Received SIGTERM shutdown signal");
        }
        () = supervisor.wait(SERVER_TASK) => {
            warn!("Server task exited");
        }
    }
    Ok(())
}
