use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use callboard_api::*;

use crate::{CallGateway, GatewayError, Result};

/// Typed HTTP client for the calls API.
///
/// Endpoints are resolved against `base_url` without any extra prefix, so
/// `base_url` should already include whatever path the API is mounted on.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared with the
    /// realtime channel).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access the underlying `reqwest::Client`.
    pub fn reqwest_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => req.bearer_auth(token),
            _ => req,
        }
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthTokenResponse> {
        self.post_json(&self.url("/auth/login"), None, req).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokenResponse> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post_json(&self.url("/auth/refresh-token"), None, &body)
            .await
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    pub async fn list_calls(&self, token: Option<&str>, query: CallListQuery) -> Result<CallPage> {
        debug!(offset = query.offset, limit = query.limit, "GET /calls");
        let req = self.client.get(self.url("/calls")).query(&query);
        let resp = self.authed(req, token).send().await?;
        let raw: CallListResponse = parse_response(resp).await?;
        Ok(raw.into())
    }

    pub async fn add_note(&self, token: Option<&str>, id: &str, content: &str) -> Result<Call> {
        let body = AddNoteRequest {
            content: content.to_string(),
        };
        self.post_json(&self.url(&format!("/calls/{id}/note")), token, &body)
            .await
    }

    pub async fn toggle_archive(&self, token: Option<&str>, id: &str) -> Result<Call> {
        let req = self.client.put(self.url(&format!("/calls/{id}/archive")));
        let resp = self.authed(req, token).send().await?;
        parse_response(resp).await
    }

    // ── Realtime ──────────────────────────────────────────────────────────

    /// Sign a private channel subscription. `endpoint` may be absolute or a
    /// path under `base_url`.
    pub async fn authorize_channel(
        &self,
        endpoint: &str,
        token: Option<&str>,
        req: &ChannelAuthRequest,
    ) -> Result<ChannelAuthResponse> {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            self.url(endpoint)
        };
        debug!(channel = %req.channel_name, "authorizing channel");
        let req = self.client.post(url).form(req);
        let resp = self.authed(req, token).send().await?;
        parse_response(resp).await
    }

    async fn post_json<B, T>(&self, url: &str, token: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let req = self.client.post(url).json(body);
        let resp = self.authed(req, token).send().await?;
        parse_response(resp).await
    }
}

impl CallGateway for ApiClient {
    async fn list_calls(&self, token: Option<&str>, query: CallListQuery) -> Result<CallPage> {
        ApiClient::list_calls(self, token, query).await
    }

    async fn add_note(&self, token: Option<&str>, id: &str, content: &str) -> Result<Call> {
        ApiClient::add_note(self, token, id, content).await
    }

    async fn toggle_archive(&self, token: Option<&str>, id: &str) -> Result<Call> {
        ApiClient::toggle_archive(self, token, id).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthTokenResponse> {
        ApiClient::login(self, req).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokenResponse> {
        ApiClient::refresh(self, refresh_token).await
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx, or a
/// [`GatewayError::Status`] carrying the server's `message` when present.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {status}"))
}
