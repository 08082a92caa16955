use anyhow::{bail, Result};
use callboard_api::LoginRequest;
use callboard_core::validate::validate_login;
use callboard_store::gate::{gate, GateDecision, LOGIN_PATH};
use callboard_store::{Action, RequestStatus};
use dialoguer::{Input, Password};

use crate::context::Context;

pub async fn run_login(username: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = Context::load()?;
    let stored = ctx.stored_session()?;
    let outcome = gate(LOGIN_PATH, stored.as_ref().map(|s| s.access_token.as_str()));
    if outcome.clear_session {
        ctx.session_file().clear()?;
    }
    if let GateDecision::Redirect(_) = outcome.decision {
        println!("Already logged in. Run `callboard logout` to switch accounts.");
        return Ok(());
    }

    let username = match username {
        Some(u) => u,
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        None => Password::new().with_prompt("Password").interact()?,
    };
    let username = username.trim().to_string();

    if let Err(errors) = validate_login(&username, &password) {
        for e in &errors {
            eprintln!("  {e}");
        }
        bail!("invalid credentials");
    }

    let (mut runtime, _client) = ctx.runtime()?;
    runtime.dispatch(Action::LogIn(LoginRequest { username, password }));
    runtime.settle().await;

    let auth = runtime.store().auth();
    if auth.status == RequestStatus::Failed || !auth.is_authenticated() {
        bail!(
            "{}",
            auth.error
                .as_deref()
                .unwrap_or(callboard_store::auth::LOGIN_FAILED)
        );
    }

    println!("Logged in.");
    println!("Session stored at {}", ctx.session_path.display());
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let ctx = Context::load()?;
    ctx.session_file().clear()?;
    println!("Logged out.");
    Ok(())
}
