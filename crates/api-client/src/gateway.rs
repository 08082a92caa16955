use std::future::Future;

use callboard_api::{AuthTokenResponse, Call, CallListQuery, CallPage, LoginRequest};

use crate::Result;

/// Remote operations the store depends on.
///
/// Authenticated calls take the bearer token explicitly so the caller
/// decides which credentials a request was issued with.
pub trait CallGateway: Send + Sync {
    fn list_calls(
        &self,
        token: Option<&str>,
        query: CallListQuery,
    ) -> impl Future<Output = Result<CallPage>> + Send;

    fn add_note(
        &self,
        token: Option<&str>,
        id: &str,
        content: &str,
    ) -> impl Future<Output = Result<Call>> + Send;

    /// Flip the archive flag server-side. The server decides the new state.
    fn toggle_archive(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> impl Future<Output = Result<Call>> + Send;

    fn login(&self, req: &LoginRequest) -> impl Future<Output = Result<AuthTokenResponse>> + Send;

    fn refresh(&self, refresh_token: &str)
    -> impl Future<Output = Result<AuthTokenResponse>> + Send;
}
