use callboard_api::AuthTokenResponse;
use tracing::{info, warn};

use crate::session::PersistedSession;
use crate::status::{error_or, RequestStatus};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REFRESH_FAILED: &str = "Session expired";
pub const NO_REFRESH_TOKEN: &str = "No refresh token";

/// What a failed refresh does to the refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Keep it so a later refresh (timer or refocus) can retry.
    #[default]
    KeepRefreshToken,
    /// Drop it together with the access token.
    ClearRefreshToken,
}

impl RefreshFailurePolicy {
    pub fn from_keep_flag(keep: bool) -> Self {
        if keep {
            Self::KeepRefreshToken
        } else {
            Self::ClearRefreshToken
        }
    }
}

/// Session credentials and the status of the last auth request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub status: RequestStatus,
    pub error: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Epoch milliseconds at which the access token expires.
    pub expires_at: Option<i64>,
}

impl AuthState {
    // ── Selectors ─────────────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Inputs for the refresh scheduler; `None` when it should stay inert.
    pub fn refresh_schedule(&self) -> Option<(&str, i64)> {
        match (self.refresh_token.as_deref(), self.expires_at) {
            (Some(rt), Some(expires_at)) if !rt.is_empty() => Some((rt, expires_at)),
            _ => None,
        }
    }

    /// Snapshot to persist, if there is an access token.
    pub fn to_persisted(&self, saved_at_ms: i64) -> Option<PersistedSession> {
        let access_token = self.access_token.clone().filter(|t| !t.is_empty())?;
        Some(PersistedSession {
            access_token,
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            saved_at: saved_at_ms,
        })
    }

    // ── Reducers ──────────────────────────────────────────────────────

    pub(crate) fn login_pending(&mut self) {
        self.status = RequestStatus::Loading;
        self.error = None;
    }

    pub(crate) fn login_settled(&mut self, result: Result<AuthTokenResponse, String>, now_ms: i64) {
        match result {
            Ok(resp) => {
                info!("login succeeded");
                self.set_tokens(resp, now_ms);
            }
            Err(e) => {
                warn!("login failed: {e}");
                self.status = RequestStatus::Failed;
                self.error = Some(error_or(e, LOGIN_FAILED));
                self.access_token = None;
                self.refresh_token = None;
                self.expires_at = None;
            }
        }
    }

    pub(crate) fn refresh_settled(
        &mut self,
        result: Result<AuthTokenResponse, String>,
        now_ms: i64,
        policy: RefreshFailurePolicy,
    ) {
        match result {
            Ok(resp) => {
                info!(expires_in = resp.expires_in_or_default(), "access token refreshed");
                self.access_token = Some(resp.access_token.clone());
                if let Some(rt) = resp.refresh_token.clone().filter(|rt| !rt.is_empty()) {
                    self.refresh_token = Some(rt);
                }
                self.expires_at = Some(expires_at(&resp, now_ms));
                self.error = None;
            }
            Err(e) => {
                warn!("token refresh failed: {e}");
                self.error = Some(error_or(e, REFRESH_FAILED));
                self.access_token = None;
                self.expires_at = None;
                if policy == RefreshFailurePolicy::ClearRefreshToken {
                    self.refresh_token = None;
                }
            }
        }
    }

    /// Install tokens directly (login success and explicit `SetAuth`).
    pub(crate) fn set_tokens(&mut self, resp: AuthTokenResponse, now_ms: i64) {
        self.expires_at = Some(expires_at(&resp, now_ms));
        self.access_token = Some(resp.access_token);
        self.refresh_token = resp.refresh_token.filter(|rt| !rt.is_empty());
        self.status = RequestStatus::Succeeded;
        self.error = None;
    }

    pub(crate) fn restore(&mut self, session: PersistedSession) {
        self.access_token = Some(session.access_token);
        self.refresh_token = session.refresh_token;
        self.expires_at = session.expires_at;
        self.status = RequestStatus::Succeeded;
        self.error = None;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

fn expires_at(resp: &AuthTokenResponse, now_ms: i64) -> i64 {
    let lifetime_ms = resp.expires_in_or_default().saturating_mul(1000);
    now_ms.saturating_add(i64::try_from(lifetime_ms).unwrap_or(i64::MAX))
}
