//! Long-running side of the callboard client.
//!
//! [`Runtime`] owns the store and applies command results, timer fires and
//! pushed updates as they arrive. The helpers here wire it to the real API
//! from a [`CallboardConfig`].

pub mod realtime;
pub mod runtime;
pub mod scheduler;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use callboard_api::Call;
use callboard_api_client::ApiClient;
use callboard_runtime_config::CallboardConfig;
use callboard_store::session::SessionFile;
use callboard_store::{RefreshFailurePolicy, RefreshTiming, StoreOptions};
use tokio::sync::{mpsc, watch};
use tracing::info;

pub use runtime::{Runtime, RuntimeEvent};
pub use scheduler::TokenScheduler;

pub fn store_options(cfg: &CallboardConfig) -> StoreOptions {
    StoreOptions {
        refresh_failure: RefreshFailurePolicy::from_keep_flag(
            cfg.auth.keep_refresh_token_on_failure,
        ),
    }
}

pub fn refresh_timing(cfg: &CallboardConfig) -> RefreshTiming {
    RefreshTiming::from_millis(cfg.auth.early_skew_ms, cfg.auth.min_delay_ms)
}

pub fn session_file(cfg: &CallboardConfig, path: &Path) -> SessionFile {
    SessionFile::new(path, Duration::from_secs(cfg.auth.session_max_age_secs))
}

/// Build the HTTP client and a runtime persisting to `session_path`.
pub fn connect(
    cfg: &CallboardConfig,
    session_path: &Path,
) -> Result<(Runtime<ApiClient>, Arc<ApiClient>)> {
    if cfg.server.url.trim().is_empty() {
        bail!("server.url is not configured (set it in the config file or CALLBOARD_API_BASE_URL)");
    }
    let client = ApiClient::new(&cfg.server.url, Duration::from_secs(cfg.server.timeout_secs))
        .context("failed to build HTTP client")?;
    let client = Arc::new(client);
    let runtime = Runtime::new(Arc::clone(&client), store_options(cfg), refresh_timing(cfg))
        .with_session_file(session_file(cfg, session_path));
    Ok((runtime, client))
}

/// Start the realtime channel if it is configured. The returned receiver
/// yields pushed calls; it simply never yields when realtime is off.
pub fn spawn_realtime(
    cfg: &CallboardConfig,
    client: Arc<ApiClient>,
    token: watch::Receiver<Option<String>>,
    shutdown: watch::Receiver<bool>,
) -> (mpsc::UnboundedReceiver<Call>, Option<tokio::task::JoinHandle<()>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    if !cfg.realtime.is_configured() {
        info!("realtime updates disabled or not configured");
        return (rx, None);
    }
    let config = realtime::ChannelConfig::from(&cfg.realtime);
    let handle = tokio::spawn(realtime::run_channel(config, client, token, tx, shutdown));
    (rx, Some(handle))
}

/// Refocus signals. On unix these are SIGUSR1 (`kill -USR1 <pid>`), which
/// a shell hook or window manager can send when the user comes back. Each
/// one is forwarded to `tx`.
pub fn spawn_refocus_signal(tx: mpsc::UnboundedSender<()>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::user_defined1()) {
            Ok(mut sigusr1) => {
                tokio::spawn(async move {
                    while sigusr1.recv().await.is_some() {
                        if tx.send(()).is_err() {
                            break;
                        }
                    }
                });
            }
            Err(e) => tracing::warn!("could not listen for SIGUSR1: {e}"),
        }
    }
    #[cfg(not(unix))]
    drop(tx);
}

/// Wait for SIGTERM or SIGINT.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) else {
            tracing::warn!("failed to register signal handlers, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}
