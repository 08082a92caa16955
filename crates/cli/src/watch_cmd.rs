use std::io::BufRead;

use anyhow::Result;
use callboard_daemon::RuntimeEvent;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::calls_cmd::{load_page, print_page};
use crate::context::Context;
use crate::output;
use crate::PageArgs;

/// Show a page, then stay attached: refresh the token on schedule, print
/// pushed updates for calls on the page, and treat Enter (or SIGUSR1) as
/// the user coming back.
pub async fn run_watch(args: &PageArgs) -> Result<()> {
    let ctx = Context::load()?;
    let (mut runtime, client) = ctx.authed_runtime()?;
    load_page(&mut runtime, args, ctx.config.list.per_page).await?;
    print_page(&runtime, false);

    if !ctx.config.realtime.is_configured() {
        println!("Realtime updates are not configured; only the session is kept fresh.");
    }
    println!("Watching for updates. Press Enter to refresh the session, Ctrl+C to quit.");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (updates, realtime_handle) = callboard_daemon::spawn_realtime(
        &ctx.config,
        client,
        runtime.token_watch(),
        shutdown_rx.clone(),
    );

    let (refocus_tx, refocus_rx) = mpsc::unbounded_channel();
    callboard_daemon::spawn_refocus_signal(refocus_tx.clone());
    // A plain thread: a pending stdin read must not hold up runtime shutdown.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            debug!("refocus requested from terminal");
            if refocus_tx.send(()).is_err() {
                break;
            }
        }
    });

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let runtime_handle = tokio::spawn(runtime.run(updates, refocus_rx, events_tx, shutdown_rx));

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                RuntimeEvent::CallUpdated(call) => println!("updated  {}", output::call_row(&call)),
                RuntimeEvent::AuthChanged { authenticated: false } => {
                    println!("Session ended. Run `callboard login` to sign in again.")
                }
                RuntimeEvent::AuthChanged { authenticated: true } | RuntimeEvent::PageLoaded => {}
                RuntimeEvent::Error(message) => eprintln!("error: {message}"),
            }
        }
    });

    callboard_daemon::wait_for_shutdown().await;
    let _ = shutdown_tx.send(true);

    let store = runtime_handle.await?;
    if let Some(handle) = realtime_handle {
        let _ = handle.await;
    }
    let _ = printer.await;

    if !store.auth().is_authenticated() {
        println!("Signed out.");
    }
    Ok(())
}
