//! The account service process, run as a supervised task.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hearth_core::Settings;

/// Supervisor name of the server task.
pub const SERVER_TASK: &str = "server";

/// Binary looked up on `PATH` when none is configured.
pub const DEFAULT_SERVER_BINARY: &str = "hearth-server";

/// Environment variables the server reads its listen addresses from.
pub const GRPC_ADDR_ENV: &str = "HEARTH_GRPC_ADDR";
pub const GRPC_WEB_ADDR_ENV: &str = "HEARTH_GRPC_WEB_ADDR";

/// Spawns the server binary and keeps it alive until cancelled.
#[derive(Debug, Clone)]
pub struct ServerTask {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub grpc_address: String,
    pub grpc_web_address: String,
    /// Grace period after SIGTERM before the process is killed.
    pub terminate_timeout: Duration,
}

impl ServerTask {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            binary: settings
                .server
                .binary
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVER_BINARY)),
            args: Vec::new(),
            grpc_address: settings.server.grpc_address.clone(),
            grpc_web_address: settings.server.grpc_web_address.clone(),
            terminate_timeout: Duration::from_secs(5),
        }
    }

    /// Run until the process exits or `cancel` fires.
    ///
    /// A non-zero exit is an error. Cancellation terminates the whole process
    /// group and counts as success.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .env(GRPC_ADDR_ENV, &self.grpc_address)
            .env(GRPC_WEB_ADDR_ENV, &self.grpc_web_address)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        // Own process group, so children of the server are signalled too
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start server {}", self.binary.display()))?;
        info!(
            binary = %self.binary.display(),
            pid = ?child.id(),
            grpc = %self.grpc_address,
            "Server started"
        );

        tokio::select! {
            status = child.wait() => {
                let status = status.context("Failed to wait for server")?;
                if status.success() {
                    info!("Server exited");
                    Ok(())
                } else {
                    anyhow::bail!("Server exited with {status}")
                }
            }
            () = cancel.cancelled() => {
                self.terminate(&mut child).await;
                Ok(())
            }
        }
    }

    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                // SAFETY: pid comes from our own Child, which was spawned as
                // the leader of its own process group.
                #[allow(unsafe_code)]
                #[allow(clippy::cast_possible_wrap)]
                let ret = unsafe { libc::kill(-(pid as i32), libc::SIGTERM) };
                if ret != 0 {
                    let err = std::io::Error::last_os_error();
                    warn!(pid, error = %err, "Failed to send SIGTERM to server");
                }
            }
        }

        match tokio::time::timeout(self.terminate_timeout, child.wait()).await {
            Ok(Ok(status)) => info!(?status, "Server stopped"),
            Ok(Err(e)) => {
                warn!(error = %e, "Error waiting for server");
                child.kill().await.ok();
            }
            Err(_) => {
                warn!("Timeout waiting for server shutdown, killing");
                child.kill().await.ok();
            }
        }
    }
}
