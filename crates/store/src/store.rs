use callboard_api::{AuthTokenResponse, Call, CallListQuery, LoginRequest};
use tracing::debug;

use crate::async_ops::{AsyncCommand, CommandResult};
use crate::auth::{AuthState, RefreshFailurePolicy};
use crate::calls::{CallsState, ADD_NOTE_FAILED, ARCHIVE_FAILED};
use crate::now_ms;
use crate::session::PersistedSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub refresh_failure: RefreshFailurePolicy,
}

/// Everything that can change the store.
///
/// Actions that need the network leave the store in its pending state and
/// hand back an [`AsyncCommand`]; the caller runs it and feeds the
/// [`CommandResult`] to [`Store::apply_command_result`].
#[derive(Debug, Clone)]
pub enum Action {
    // ── Calls ─────────────────────────────────────────────────────────
    FetchCalls { page: u32, per_page: u32 },
    FilterCalls(String),
    SetPage(u32),
    SetPerPage(u32),
    ClearCalls,
    /// A snapshot pushed by the realtime channel.
    ApplyCallUpdate(Call),
    AddNote { id: String, content: String },
    ArchiveCall { id: String, is_archiving: bool },

    // ── Auth ──────────────────────────────────────────────────────────
    LogIn(LoginRequest),
    RefreshAccessToken,
    SetAuth(AuthTokenResponse),
    RestoreSession(PersistedSession),
    ClearAuth,
}

/// State container owned by the application root.
///
/// Fields are private; reads go through [`Store::calls`] and
/// [`Store::auth`], writes only through dispatch.
#[derive(Debug, Clone, Default)]
pub struct Store {
    calls: CallsState,
    auth: AuthState,
    options: StoreOptions,
}

impl Store {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &CallsState {
        &self.calls
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Fetch action for the page/per-page currently in state.
    pub fn refetch_action(&self) -> Action {
        Action::FetchCalls {
            page: self.calls.pagination.page,
            per_page: self.calls.pagination.per_page,
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Option<AsyncCommand> {
        self.dispatch_at(action, now_ms())
    }

    /// [`Store::dispatch`] with an explicit clock, in epoch milliseconds.
    pub fn dispatch_at(&mut self, action: Action, now_ms: i64) -> Option<AsyncCommand> {
        match action {
            Action::FetchCalls { page, per_page } => {
                let request_id = self.calls.fetch_pending();
                Some(AsyncCommand::FetchCalls {
                    request_id,
                    token: self.auth.access_token.clone(),
                    query: CallListQuery::for_page(page.max(1), per_page.max(1)),
                })
            }
            Action::FilterCalls(key) => {
                self.calls.filter(&key);
                None
            }
            Action::SetPage(page) => {
                self.calls.set_page(page);
                None
            }
            Action::SetPerPage(per_page) => {
                self.calls.set_per_page(per_page);
                None
            }
            Action::ClearCalls => {
                self.calls.clear();
                None
            }
            Action::ApplyCallUpdate(call) => {
                if !self.calls.apply_call_update(&call) {
                    debug!(call_id = %call.id, "realtime update for call not on this page");
                }
                None
            }
            Action::AddNote { id, content } => Some(AsyncCommand::AddNote {
                token: self.auth.access_token.clone(),
                id,
                content,
            }),
            Action::ArchiveCall { id, is_archiving } => Some(AsyncCommand::ArchiveCall {
                token: self.auth.access_token.clone(),
                id,
                is_archiving,
            }),

            Action::LogIn(req) => {
                self.auth.login_pending();
                Some(AsyncCommand::LogIn(req))
            }
            Action::RefreshAccessToken => Some(AsyncCommand::RefreshAccessToken {
                refresh_token: self.auth.refresh_token.clone(),
            }),
            Action::SetAuth(resp) => {
                self.auth.set_tokens(resp, now_ms);
                None
            }
            Action::RestoreSession(session) => {
                self.auth.restore(session);
                None
            }
            Action::ClearAuth => {
                self.auth.clear();
                None
            }
        }
    }

    // ── Apply async command result ────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        self.apply_command_result_at(result, now_ms());
    }

    pub fn apply_command_result_at(&mut self, result: CommandResult, now_ms: i64) {
        match result {
            CommandResult::Calls { request_id, result } => {
                self.calls.fetch_settled(request_id, result);
            }
            CommandResult::NoteAdded(result) => {
                self.calls.mutation_settled(result, ADD_NOTE_FAILED);
            }
            CommandResult::Archived {
                is_archiving,
                result,
            } => {
                if let Ok(call) = &result {
                    debug!(
                        call_id = %call.id,
                        is_archiving,
                        is_archived = call.is_archived,
                        "archive toggled"
                    );
                }
                self.calls.mutation_settled(result, ARCHIVE_FAILED);
            }
            CommandResult::LoggedIn(result) => {
                self.auth.login_settled(result, now_ms);
            }
            CommandResult::Refreshed(result) => {
                self.auth
                    .refresh_settled(result, now_ms, self.options.refresh_failure);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::RequestStatus;
    use callboard_api::CallPage;
    use callboard_core::testing;

    const NOW: i64 = 1_700_000_000_000;

    fn authed_store() -> Store {
        let mut store = Store::default();
        store.dispatch_at(
            Action::SetAuth(AuthTokenResponse {
                access_token: "at-1".into(),
                refresh_token: Some("rt-1".into()),
                expires_in: Some(60),
            }),
            NOW,
        );
        store
    }

    fn load(store: &mut Store, nodes: Vec<Call>, total_count: u64) {
        let action = store.refetch_action();
        let Some(AsyncCommand::FetchCalls { request_id, .. }) = store.dispatch_at(action, NOW)
        else {
            panic!("fetch must produce a command");
        };
        store.apply_command_result_at(
            CommandResult::Calls {
                request_id,
                result: Ok(CallPage {
                    nodes,
                    total_count,
                    has_next_page: false,
                }),
            },
            NOW,
        );
    }

    #[test]
    fn fetch_command_captures_token_and_query() {
        let mut store = authed_store();
        let cmd = store.dispatch_at(
            Action::FetchCalls {
                page: 3,
                per_page: 25,
            },
            NOW,
        );
        match cmd {
            Some(AsyncCommand::FetchCalls {
                request_id,
                token,
                query,
            }) => {
                assert_eq!(request_id, 1);
                assert_eq!(token.as_deref(), Some("at-1"));
                assert_eq!(query.offset, 50);
                assert_eq!(query.limit, 25);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(store.calls().status, RequestStatus::Loading);
    }

    #[test]
    fn page_changes_do_not_fetch_by_themselves() {
        let mut store = authed_store();
        assert!(store.dispatch_at(Action::SetPage(5), NOW).is_none());
        assert!(store.dispatch_at(Action::SetPerPage(20), NOW).is_none());
        assert!(matches!(
            store.refetch_action(),
            Action::FetchCalls {
                page: 5,
                per_page: 20
            }
        ));
    }

    #[test]
    fn filter_all_matches_backup() {
        let mut store = authed_store();
        load(&mut store, testing::mixed_page(), 6);
        store.dispatch_at(Action::FilterCalls("missed".into()), NOW);
        store.dispatch_at(Action::FilterCalls("ALL".into()), NOW);
        assert_eq!(store.calls().calls, store.calls().backup_calls);
    }

    #[test]
    fn archive_intent_is_not_sent() {
        let mut store = authed_store();
        let cmd = store.dispatch_at(
            Action::ArchiveCall {
                id: "c-1".into(),
                is_archiving: true,
            },
            NOW,
        );
        assert!(matches!(
            cmd,
            Some(AsyncCommand::ArchiveCall { ref id, is_archiving: true, .. }) if id == "c-1"
        ));
        // Mutations never flip the list status.
        assert_eq!(store.calls().status, RequestStatus::Idle);
    }

    #[test]
    fn archive_success_then_unarchived_filter_excludes_call() {
        let mut store = authed_store();
        load(&mut store, vec![testing::call("c-1"), testing::call("c-2")], 2);

        let mut archived = testing::call("c-1");
        archived.is_archived = true;
        store.apply_command_result_at(
            CommandResult::Archived {
                is_archiving: true,
                result: Ok(archived.clone()),
            },
            NOW,
        );
        assert_eq!(store.calls().find("c-1"), Some(&archived));

        store.dispatch_at(Action::FilterCalls("unarchived".into()), NOW);
        let ids: Vec<_> = store.calls().calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c-2"]);
    }

    #[test]
    fn refresh_without_token_still_issues_command() {
        let mut store = Store::default();
        let cmd = store.dispatch_at(Action::RefreshAccessToken, NOW);
        assert!(matches!(
            cmd,
            Some(AsyncCommand::RefreshAccessToken {
                refresh_token: None
            })
        ));
    }

    #[test]
    fn refresh_failure_follows_configured_policy() {
        let mut store = Store::new(StoreOptions {
            refresh_failure: RefreshFailurePolicy::ClearRefreshToken,
        });
        store.dispatch_at(
            Action::SetAuth(AuthTokenResponse {
                access_token: "at-1".into(),
                refresh_token: Some("rt-1".into()),
                expires_in: None,
            }),
            NOW,
        );
        store.apply_command_result_at(CommandResult::Refreshed(Err("nope".into())), NOW);
        assert_eq!(store.auth().refresh_token, None);
        assert_eq!(store.auth().access_token, None);
    }

    #[test]
    fn clear_auth_resets_everything() {
        let mut store = authed_store();
        store.dispatch_at(Action::ClearAuth, NOW);
        assert_eq!(store.auth(), &AuthState::default());
    }
}
