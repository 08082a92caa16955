use std::sync::Arc;

use callboard_api::Call;
use callboard_api_client::CallGateway;
use callboard_store::session::{SessionError, SessionFile};
use callboard_store::{
    execute, now_ms, Action, AsyncCommand, AuthState, CommandResult, RefreshTiming, Store,
    StoreOptions,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::scheduler::TokenScheduler;

/// What changed after the runtime processed something, for a front end to
/// render.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    PageLoaded,
    CallUpdated(Call),
    AuthChanged { authenticated: bool },
    Error(String),
}

/// Owns the store and everything that feeds it: command execution, the
/// refresh timer, the persisted session and pushed call updates.
pub struct Runtime<G> {
    store: Store,
    gateway: Arc<G>,
    session: Option<SessionFile>,
    scheduler: TokenScheduler,
    refresh_due: mpsc::UnboundedReceiver<()>,
    results_tx: mpsc::UnboundedSender<CommandResult>,
    results_rx: mpsc::UnboundedReceiver<CommandResult>,
    in_flight: usize,
    token_tx: watch::Sender<Option<String>>,
}

impl<G: CallGateway + 'static> Runtime<G> {
    pub fn new(gateway: Arc<G>, options: StoreOptions, timing: RefreshTiming) -> Self {
        let (scheduler, refresh_due) = TokenScheduler::new(timing);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (token_tx, _) = watch::channel(None);
        Self {
            store: Store::new(options),
            gateway,
            session: None,
            scheduler,
            refresh_due,
            results_tx,
            results_rx,
            in_flight: 0,
            token_tx,
        }
    }

    /// Persist credentials to `file` whenever they change.
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.session = Some(file);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Follows the current access token; the realtime channel keys its
    /// connection off this.
    pub fn token_watch(&self) -> watch::Receiver<Option<String>> {
        self.token_tx.subscribe()
    }

    /// Load a persisted session, if any. Returns whether one was restored.
    pub fn restore_session(&mut self) -> Result<bool, SessionError> {
        let Some(file) = &self.session else {
            return Ok(false);
        };
        let Some(session) = file.load(now_ms())? else {
            return Ok(false);
        };
        debug!(path = %file.path().display(), "restoring session");
        // Restoring must not rewrite the file, or its max-age would slide.
        if let Some(cmd) = self.store.dispatch(Action::RestoreSession(session)) {
            self.spawn(cmd);
        }
        self.sync_auth();
        Ok(true)
    }

    /// Dispatch into the store and start any command it asks for.
    pub fn dispatch(&mut self, action: Action) {
        let before = self.store.auth().clone();
        if let Some(cmd) = self.store.dispatch(action) {
            self.spawn(cmd);
        }
        self.auth_touched(&before);
    }

    /// The user is back: refresh straight away if the token is close to
    /// expiring. Returns whether a refresh was started.
    pub fn refocus(&mut self) -> bool {
        let due = self
            .scheduler
            .refocus(self.store.auth().refresh_schedule(), now_ms());
        if due {
            info!("refocused near token expiry, refreshing");
            self.dispatch(Action::RefreshAccessToken);
        }
        due
    }

    /// Wait until every started command has been applied.
    pub async fn settle(&mut self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let Some(result) = self.results_rx.recv().await else {
                break;
            };
            events.extend(self.apply(result));
        }
        events
    }

    /// Drive the store until shutdown: command results, refresh timer,
    /// pushed updates and refocus signals.
    pub async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<Call>,
        mut refocus: mpsc::UnboundedReceiver<()>,
        events: mpsc::UnboundedSender<RuntimeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Store {
        loop {
            tokio::select! {
                Some(result) = self.results_rx.recv() => {
                    for event in self.apply(result) {
                        let _ = events.send(event);
                    }
                }

                Some(()) = self.refresh_due.recv() => {
                    info!("access token refresh due");
                    self.dispatch(Action::RefreshAccessToken);
                }

                Some(call) = updates.recv() => {
                    let known = self.store.calls().find(&call.id).is_some();
                    self.dispatch(Action::ApplyCallUpdate(call.clone()));
                    if known {
                        let _ = events.send(RuntimeEvent::CallUpdated(call));
                    }
                }

                Some(()) = refocus.recv() => {
                    self.refocus();
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Runtime shutting down");
                        break;
                    }
                }
            }
        }
        self.scheduler.disarm();
        self.store
    }

    fn spawn(&mut self, cmd: AsyncCommand) {
        self.in_flight += 1;
        let gateway = Arc::clone(&self.gateway);
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = execute(gateway.as_ref(), cmd).await;
            let _ = tx.send(result);
        });
    }

    fn apply(&mut self, result: CommandResult) -> Vec<RuntimeEvent> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let before = self.store.auth().clone();
        let was_authenticated = before.is_authenticated();

        let mut events = Vec::new();
        let stale = matches!(
            &result,
            CommandResult::Calls { request_id, .. }
                if *request_id != self.store.calls().latest_fetch_id
        );
        let failed = !stale && result.error().is_some();
        let is_auth = matches!(
            result,
            CommandResult::LoggedIn(_) | CommandResult::Refreshed(_)
        );
        let is_page = matches!(result, CommandResult::Calls { result: Ok(_), .. });
        let updated = match &result {
            CommandResult::NoteAdded(Ok(call)) | CommandResult::Archived { result: Ok(call), .. } => {
                Some(call.clone())
            }
            _ => None,
        };

        self.store.apply_command_result(result);

        if stale {
            return events;
        }
        if is_page {
            events.push(RuntimeEvent::PageLoaded);
        }
        if let Some(call) = updated {
            events.push(RuntimeEvent::CallUpdated(call));
        }
        if self.store.auth().is_authenticated() != was_authenticated {
            events.push(RuntimeEvent::AuthChanged {
                authenticated: self.store.auth().is_authenticated(),
            });
        }
        if failed {
            let message = if is_auth {
                self.store.auth().error.clone()
            } else {
                self.store.calls().error.clone()
            };
            if let Some(message) = message {
                warn!("request failed: {message}");
                events.push(RuntimeEvent::Error(message));
            }
        }

        self.auth_touched(&before);
        events
    }

    /// Keep the session file, refresh timer and token watch in step with
    /// the auth state.
    fn auth_touched(&mut self, before: &AuthState) {
        let auth = self.store.auth();
        if auth.access_token != before.access_token
            || auth.refresh_token != before.refresh_token
            || auth.expires_at != before.expires_at
        {
            self.persist();
        }
        self.sync_auth();
    }

    fn sync_auth(&mut self) {
        let now = now_ms();
        self.scheduler.sync(self.store.auth().refresh_schedule(), now);

        let token = self.store.auth().access_token.clone();
        self.token_tx.send_if_modified(|current| {
            if *current == token {
                return false;
            }
            *current = token;
            true
        });
    }

    fn persist(&self) {
        let Some(file) = &self.session else {
            return;
        };
        let result = match self.store.auth().to_persisted(now_ms()) {
            Some(session) => file.save(&session),
            None => file.clear(),
        };
        if let Err(e) = result {
            warn!("failed to persist session: {e}");
        }
    }
}
