//! Route gating between the login entry point and the calls view.

pub const LOGIN_PATH: &str = "/login";
pub const CALLS_PATH: &str = "/calls";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Calls,
    /// Not gated.
    Other,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            LOGIN_PATH => Self::Login,
            _ if trimmed == CALLS_PATH || trimmed.starts_with("/calls/") => Self::Calls,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: GateDecision,
    /// The persisted session should be wiped.
    pub clear_session: bool,
}

/// Decide where navigation to `path` ends up given the persisted token.
///
/// Without a token the session is cleared and anything but the login page
/// redirects there; with a token the login page redirects to the calls
/// view. Paths outside the gated set always proceed untouched.
pub fn gate(path: &str, token: Option<&str>) -> GateOutcome {
    let route = Route::parse(path);
    if route == Route::Other {
        return GateOutcome {
            decision: GateDecision::Proceed,
            clear_session: false,
        };
    }

    let has_token = token.is_some_and(|t| !t.trim().is_empty());
    if !has_token {
        let decision = if route == Route::Login {
            GateDecision::Proceed
        } else {
            GateDecision::Redirect(LOGIN_PATH)
        };
        return GateOutcome {
            decision,
            clear_session: true,
        };
    }

    let decision = if route == Route::Login {
        GateDecision::Redirect(CALLS_PATH)
    } else {
        GateDecision::Proceed
    };
    GateOutcome {
        decision,
        clear_session: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gated_routes() {
        assert_eq!(Route::parse("/"), Route::Root);
        assert_eq!(Route::parse("/login?next=/calls"), Route::Login);
        assert_eq!(Route::parse("/calls"), Route::Calls);
        assert_eq!(Route::parse("/calls/abc/notes"), Route::Calls);
        assert_eq!(Route::parse("/callsheet"), Route::Other);
        assert_eq!(Route::parse("/settings"), Route::Other);
    }

    #[test]
    fn anonymous_calls_redirects_to_login_and_clears() {
        let outcome = gate("/calls", None);
        assert_eq!(outcome.decision, GateDecision::Redirect(LOGIN_PATH));
        assert!(outcome.clear_session);

        assert_eq!(gate("/", Some("")).decision, GateDecision::Redirect(LOGIN_PATH));
    }

    #[test]
    fn anonymous_login_proceeds() {
        let outcome = gate("/login", None);
        assert_eq!(outcome.decision, GateDecision::Proceed);
        assert!(outcome.clear_session);
    }

    #[test]
    fn authenticated_login_redirects_to_calls() {
        let outcome = gate("/login", Some("at-1"));
        assert_eq!(outcome.decision, GateDecision::Redirect(CALLS_PATH));
        assert!(!outcome.clear_session);
        assert_eq!(gate("/calls/42", Some("at-1")).decision, GateDecision::Proceed);
    }

    #[test]
    fn ungated_paths_pass_through() {
        assert_eq!(
            gate("/favicon.ico", None),
            GateOutcome {
                decision: GateDecision::Proceed,
                clear_session: false
            }
        );
    }
}
