//! Request and response types for the calls API.
//!
//! Every HTTP contract the client speaks lives here so the gateway, the
//! store, and test servers agree on one shape.

use serde::{Deserialize, Serialize};

pub use callboard_core::{Call, CallType, Direction, Note};

/// Access-token lifetime assumed when the server omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 9 * 60;

// ─── Auth ────────────────────────────────────────────────────────────────────

/// `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl AuthTokenResponse {
    pub fn expires_in_or_default(&self) -> u64 {
        self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS)
    }
}

/// `POST /auth/refresh-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ─── Calls ───────────────────────────────────────────────────────────────────

/// Query for `GET /calls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallListQuery {
    pub offset: u64,
    pub limit: u32,
}

impl CallListQuery {
    /// Query for a 1-indexed page.
    pub fn for_page(page: u32, per_page: u32) -> Self {
        Self {
            offset: callboard_core::pagination::offset_for(page, per_page),
            limit: per_page,
        }
    }
}

/// Raw page as sent by the server. Some deployments answer with `data`
/// instead of `nodes`, and `totalCount` is occasionally missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallListResponse {
    #[serde(default, alias = "data")]
    pub nodes: Vec<Call>,
    #[serde(rename = "totalCount", default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(rename = "hasNextPage", default)]
    pub has_next_page: bool,
}

/// Normalised page handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPage {
    pub nodes: Vec<Call>,
    pub total_count: u64,
    pub has_next_page: bool,
}

impl From<CallListResponse> for CallPage {
    fn from(raw: CallListResponse) -> Self {
        let total_count = raw.total_count.unwrap_or(raw.nodes.len() as u64);
        Self {
            nodes: raw.nodes,
            total_count,
            has_next_page: raw.has_next_page,
        }
    }
}

/// `POST /calls/:id/note`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNoteRequest {
    pub content: String,
}

// ─── Realtime ────────────────────────────────────────────────────────────────

/// Form body posted to the channel auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAuthRequest {
    pub socket_id: String,
    pub channel_name: String,
}

/// Signature returned by the channel auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAuthResponse {
    pub auth: String,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
