#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Login, logout and unattended recovery against a scripted server, with the
//! profile persisted to a temporary directory.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use common::{ScriptedServer, TOKEN};
use hearth_cli::config::ConfigManager;
use hearth_cli::credentials::{CredentialStore, ProfileStore, SecretBackend, SecretKind};
use hearth_cli::events::EventHub;
use hearth_cli::gateway::InitialParameters;
use hearth_cli::session::{
    OrchestratorConfig, RecoveryOutcome, RetryPolicy, SessionOrchestrator, Sleeper,
};

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

fn setup(
    server: ScriptedServer,
    account_wait: Duration,
) -> (tempfile::TempDir, Arc<ScriptedServer>, Arc<ConfigManager>, SessionOrchestrator) {
    let dir = tempfile::tempdir().unwrap();
    let profile = Arc::new(ConfigManager::load(dir.path().join("config.json")).unwrap());
    let server = Arc::new(server);
    let events = Arc::new(EventHub::new(server.clone()));
    let config = OrchestratorConfig {
        params: InitialParameters::for_client(dir.path(), "info"),
        storage_path: dir.path().join("data").to_string_lossy().into_owned(),
        listen_address: "127.0.0.1:31009".into(),
        account_wait,
    };
    let orchestrator =
        SessionOrchestrator::new(server.clone(), events, profile.clone(), profile.clone(), config);
    (dir, server, profile, orchestrator)
}

fn account_key() -> String {
    STANDARD.encode([42u8; 32])
}

#[tokio::test]
async fn account_event_after_50ms_is_picked_up_within_1s() {
    let (_dir, _server, _profile, orchestrator) = setup(
        ScriptedServer::new("acc-e2e", Duration::from_millis(50)),
        Duration::from_secs(1),
    );

    let session = orchestrator
        .establish_session(&account_key(), None, None)
        .await
        .unwrap();

    assert_eq!(session.account_id, "acc-e2e");
    assert_eq!(session.token, TOKEN);
}

#[tokio::test]
async fn recovery_is_triggered_only_after_subscription() {
    let (_dir, server, _profile, orchestrator) = setup(
        ScriptedServer::new("acc-1", Duration::ZERO),
        Duration::from_secs(1),
    );

    orchestrator.login(&account_key(), None, None).await.unwrap();

    let subscribed = server.position("subscribe").unwrap();
    let recovered = server.position("recover_account").unwrap();
    assert!(subscribed < recovered, "calls: {:?}", server.calls());
    assert_eq!(server.subscriptions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_persists_to_profile_file() {
    let (_dir, _server, profile, orchestrator) = setup(
        ScriptedServer::new("acc-1", Duration::from_millis(10)),
        Duration::from_secs(1),
    );
    orchestrator.login(&account_key(), None, None).await.unwrap();

    let reloaded = ConfigManager::load(profile.path()).unwrap();
    assert_eq!(reloaded.account_id().as_deref(), Some("acc-1"));
    assert_eq!(reloaded.tech_space_id().as_deref(), Some("tech-space"));
    assert_eq!(
        reloaded.get(SecretKind::SessionToken).unwrap(),
        Some((TOKEN.to_string(), SecretBackend::File))
    );

    orchestrator.logout().await.unwrap();
    assert!(!profile.path().exists());
}

#[tokio::test]
async fn auto_recover_makes_exactly_max_attempts() {
    let (_dir, server, _profile, orchestrator) =
        setup(ScriptedServer::unreachable(), Duration::from_secs(1));
    let policy = RetryPolicy::fixed(3, Duration::from_secs(2));

    let outcome = orchestrator
        .auto_recover(Some("stored"), None, &policy, &NoSleep)
        .await;

    assert!(matches!(
        outcome,
        RecoveryOutcome::GaveUp { attempts: 3, .. }
    ));
    assert_eq!(
        server
            .calls()
            .iter()
            .filter(|c| **c == "set_initial_parameters")
            .count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn silent_server_times_out_at_the_account_wait() {
    let (_dir, _server, _profile, orchestrator) = setup(
        ScriptedServer::new("acc-1", Duration::from_secs(3600)),
        Duration::from_secs(10),
    );
    let start = tokio::time::Instant::now();

    let err = orchestrator
        .establish_session(&account_key(), None, None)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
    assert!(start.elapsed() >= Duration::from_secs(10));
}
