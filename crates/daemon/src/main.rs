use anyhow::{bail, Result};
use callboard_daemon::RuntimeEvent;
use callboard_store::Action;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,callboard_daemon=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        error!("Daemon fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    info!("callboard-daemon starting");

    let cfg = callboard_runtime_config::load_config()?;
    let config_path = callboard_runtime_config::config_path()?;
    let session_path = callboard_runtime_config::session_path_for(&config_path);

    let (mut runtime, client) = callboard_daemon::connect(&cfg, &session_path)?;
    if !runtime.restore_session()? {
        bail!("no stored session at {}; run `callboard login` first", session_path.display());
    }

    runtime.dispatch(Action::SetPerPage(cfg.list.per_page));
    runtime.dispatch(runtime.store().refetch_action());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (updates, realtime_handle) = callboard_daemon::spawn_realtime(
        &cfg,
        client,
        runtime.token_watch(),
        shutdown_rx.clone(),
    );
    let (refocus_tx, refocus) = mpsc::unbounded_channel();
    callboard_daemon::spawn_refocus_signal(refocus_tx);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let runtime_handle = tokio::spawn(runtime.run(updates, refocus, events_tx, shutdown_rx));

    let log_handle = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                RuntimeEvent::PageLoaded => info!("call page loaded"),
                RuntimeEvent::CallUpdated(call) => {
                    info!(call_id = %call.id, archived = call.is_archived, "call updated")
                }
                RuntimeEvent::AuthChanged { authenticated } => {
                    info!(authenticated, "session changed")
                }
                RuntimeEvent::Error(message) => warn!("{message}"),
            }
        }
    });

    callboard_daemon::wait_for_shutdown().await;

    info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);

    let store = runtime_handle.await?;
    if let Some(handle) = realtime_handle {
        let _ = handle.await;
    }
    let _ = log_handle.await;

    info!(
        authenticated = store.auth().is_authenticated(),
        "callboard-daemon stopped"
    );
    Ok(())
}
