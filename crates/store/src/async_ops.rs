use callboard_api::{AuthTokenResponse, Call, CallListQuery, CallPage, LoginRequest};
use callboard_api_client::CallGateway;
use tracing::debug;

use crate::auth::NO_REFRESH_TOKEN;

/// Commands that require async I/O (network calls).
///
/// Each command carries everything it needs, including the bearer token
/// captured when it was dispatched, so it can run detached from the store.
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    FetchCalls {
        request_id: u64,
        token: Option<String>,
        query: CallListQuery,
    },
    AddNote {
        token: Option<String>,
        id: String,
        content: String,
    },
    /// `is_archiving` is the caller's intent, kept for labelling only. The
    /// server toggles and is authoritative.
    ArchiveCall {
        token: Option<String>,
        id: String,
        is_archiving: bool,
    },
    LogIn(LoginRequest),
    RefreshAccessToken { refresh_token: Option<String> },
}

impl AsyncCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchCalls { .. } => "fetch_calls",
            Self::AddNote { .. } => "add_note",
            Self::ArchiveCall { .. } => "archive_call",
            Self::LogIn(_) => "log_in",
            Self::RefreshAccessToken { .. } => "refresh_access_token",
        }
    }
}

/// Results returned by async commands. Errors are already reduced to the
/// message the store records.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Calls {
        request_id: u64,
        result: Result<CallPage, String>,
    },
    NoteAdded(Result<Call, String>),
    Archived {
        is_archiving: bool,
        result: Result<Call, String>,
    },
    LoggedIn(Result<AuthTokenResponse, String>),
    Refreshed(Result<AuthTokenResponse, String>),
}

impl CommandResult {
    pub fn error(&self) -> Option<&str> {
        let err = match self {
            Self::Calls { result, .. } => result.as_ref().err(),
            Self::NoteAdded(result) | Self::Archived { result, .. } => result.as_ref().err(),
            Self::LoggedIn(result) | Self::Refreshed(result) => result.as_ref().err(),
        };
        err.map(String::as_str)
    }
}

pub async fn execute<G: CallGateway>(gateway: &G, cmd: AsyncCommand) -> CommandResult {
    debug!(command = cmd.name(), "executing");
    match cmd {
        AsyncCommand::FetchCalls {
            request_id,
            token,
            query,
        } => {
            let result = gateway
                .list_calls(token.as_deref(), query)
                .await
                .map_err(|e| e.to_string());
            CommandResult::Calls { request_id, result }
        }

        AsyncCommand::AddNote { token, id, content } => {
            let result = gateway
                .add_note(token.as_deref(), &id, &content)
                .await
                .map_err(|e| e.to_string());
            CommandResult::NoteAdded(result)
        }

        AsyncCommand::ArchiveCall {
            token,
            id,
            is_archiving,
        } => {
            let result = gateway
                .toggle_archive(token.as_deref(), &id)
                .await
                .map_err(|e| e.to_string());
            CommandResult::Archived {
                is_archiving,
                result,
            }
        }

        AsyncCommand::LogIn(req) => {
            let result = gateway.login(&req).await.map_err(|e| e.to_string());
            CommandResult::LoggedIn(result)
        }

        AsyncCommand::RefreshAccessToken { refresh_token } => {
            let result = match refresh_token.as_deref().filter(|rt| !rt.is_empty()) {
                Some(rt) => gateway.refresh(rt).await.map_err(|e| e.to_string()),
                None => Err(NO_REFRESH_TOKEN.to_string()),
            };
            CommandResult::Refreshed(result)
        }
    }
}
