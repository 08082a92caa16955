use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use callboard_api_client::ApiClient;
use callboard_daemon::Runtime;
use callboard_runtime_config::CallboardConfig;
use callboard_store::gate::{gate, GateDecision, CALLS_PATH};
use callboard_store::now_ms;
use callboard_store::session::{PersistedSession, SessionFile};

/// Loaded configuration plus where the session lives.
pub struct Context {
    pub config: CallboardConfig,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config_path = callboard_runtime_config::config_path()?;
        let config = callboard_runtime_config::load_config().context("failed to load config")?;
        let session_path = callboard_runtime_config::session_path_for(&config_path);
        Ok(Self {
            config,
            config_path,
            session_path,
        })
    }

    pub fn session_file(&self) -> SessionFile {
        callboard_daemon::session_file(&self.config, &self.session_path)
    }

    pub fn stored_session(&self) -> Result<Option<PersistedSession>> {
        Ok(self.session_file().load(now_ms())?)
    }

    /// Runtime without any restored credentials.
    pub fn runtime(&self) -> Result<(Runtime<ApiClient>, Arc<ApiClient>)> {
        callboard_daemon::connect(&self.config, &self.session_path)
    }

    /// Runtime for a command that needs a signed-in user. Runs the route
    /// gate for the calls view against the stored session first.
    pub fn authed_runtime(&self) -> Result<(Runtime<ApiClient>, Arc<ApiClient>)> {
        let stored = self.stored_session()?;
        let outcome = gate(CALLS_PATH, stored.as_ref().map(|s| s.access_token.as_str()));
        if outcome.clear_session {
            self.session_file().clear()?;
        }
        if let GateDecision::Redirect(_) = outcome.decision {
            bail!("not logged in; run `callboard login` first");
        }

        let (mut runtime, client) = self.runtime()?;
        runtime.restore_session()?;
        Ok((runtime, client))
    }
}
