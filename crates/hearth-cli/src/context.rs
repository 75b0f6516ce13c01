//! Composition root shared by the subcommands.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use hearth_core::Settings;

use crate::config::ConfigManager;
use crate::connection::{ConnectionConfig, GrpcGateway};
use crate::events::EventHub;
use crate::gateway::{EventSource, Gateway};
use crate::session::{OrchestratorConfig, SessionOrchestrator};

/// Everything a subcommand needs, wired once per process.
pub struct ClientContext {
    pub settings: Settings,
    pub profile: Arc<ConfigManager>,
    pub orchestrator: SessionOrchestrator,
    /// Cancelled on process shutdown; the event stream hangs off it.
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("settings", &self.settings)
            .field("profile", &self.profile.path())
            .finish_non_exhaustive()
    }
}

impl ClientContext {
    /// Wire the tonic gateway and the on-disk profile.
    ///
    /// The channel dials lazily, so this succeeds while the server is down.
    pub fn build(settings: Settings) -> anyhow::Result<Self> {
        let config = OrchestratorConfig::from_settings(&settings)?;
        Self::build_with(settings, config)
    }

    /// Same as [`Self::build`] with the longer account wait of unattended flows.
    pub fn build_batch(settings: Settings) -> anyhow::Result<Self> {
        let config = OrchestratorConfig::from_settings(&settings)?.batch(&settings);
        Self::build_with(settings, config)
    }

    fn build_with(settings: Settings, config: OrchestratorConfig) -> anyhow::Result<Self> {
        let gateway = Arc::new(
            GrpcGateway::connect_lazy(ConnectionConfig::from_settings(&settings))
                .context("Failed to configure server connection")?,
        );
        let profile = Arc::new(ConfigManager::open_default().context("Failed to load profile")?);
        Ok(Self::from_parts(
            settings,
            gateway.clone(),
            gateway,
            profile,
            config,
        ))
    }

    pub fn from_parts(
        settings: Settings,
        gateway: Arc<dyn Gateway>,
        source: Arc<dyn EventSource>,
        profile: Arc<ConfigManager>,
        config: OrchestratorConfig,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let events = Arc::new(EventHub::with_shutdown(source, shutdown.clone()));
        let orchestrator =
            SessionOrchestrator::new(gateway, events, profile.clone(), profile.clone(), config);
        Self {
            settings,
            profile,
            orchestrator,
            shutdown,
        }
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.orchestrator.gateway().as_ref()
    }

    /// Stored session token, with a hint when there is none.
    pub fn token(&self) -> anyhow::Result<String> {
        self.orchestrator
            .stored_token()
            .context("Run `hearth auth login` first")
    }
}
