use anyhow::{bail, Result};
use callboard_api_client::ApiClient;
use callboard_core::validate::validate_note;
use callboard_daemon::{Runtime, RuntimeEvent};
use callboard_store::{Action, RequestStatus};
use chrono::Utc;

use crate::context::Context;
use crate::output;
use crate::PageArgs;

/// Load the requested page into `runtime` and apply the filter.
pub async fn load_page(
    runtime: &mut Runtime<ApiClient>,
    args: &PageArgs,
    default_per_page: u32,
) -> Result<()> {
    runtime.dispatch(Action::SetPerPage(args.per_page.unwrap_or(default_per_page)));
    runtime.dispatch(Action::SetPage(args.page));
    runtime.dispatch(runtime.store().refetch_action());
    runtime.settle().await;

    let calls = runtime.store().calls();
    if calls.status == RequestStatus::Failed {
        bail!(
            "{}",
            calls
                .error
                .as_deref()
                .unwrap_or(callboard_store::calls::FETCH_FAILED)
        );
    }
    runtime.dispatch(Action::FilterCalls(args.filter.clone()));
    Ok(())
}

pub fn print_page(runtime: &Runtime<ApiClient>, with_notes: bool) {
    let calls = runtime.store().calls();
    output::print_calls(&calls.calls, with_notes, Utc::now());
    println!();
    if !calls.active_filter.is_all() {
        println!(
            "Showing {} of {} on this page ({})",
            calls.calls.len(),
            calls.backup_calls.len(),
            calls.active_filter
        );
    }
    println!(
        "{}",
        output::page_footer(calls.range(), calls.pagination.page, calls.total_pages())
    );
}

pub async fn run_calls(args: &PageArgs, with_notes: bool) -> Result<()> {
    let ctx = Context::load()?;
    let (mut runtime, _client) = ctx.authed_runtime()?;
    load_page(&mut runtime, args, ctx.config.list.per_page).await?;
    print_page(&runtime, with_notes);
    Ok(())
}

pub async fn run_note(id: &str, content: &str) -> Result<()> {
    let content = validate_note(content)?;
    let ctx = Context::load()?;
    let (mut runtime, _client) = ctx.authed_runtime()?;

    runtime.dispatch(Action::AddNote {
        id: id.to_string(),
        content: content.to_string(),
    });
    let call = expect_updated(runtime.settle().await)?;

    println!("Note added to {}.", call.id);
    for line in output::note_lines(&call, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_archive(id: &str, is_archiving: bool) -> Result<()> {
    let ctx = Context::load()?;
    let (mut runtime, _client) = ctx.authed_runtime()?;

    runtime.dispatch(Action::ArchiveCall {
        id: id.to_string(),
        is_archiving,
    });
    let call = expect_updated(runtime.settle().await)?;

    if call.is_archived != is_archiving {
        eprintln!("note: the server toggled {} the other way", call.id);
    }
    let verb = if call.is_archived { "Archived" } else { "Unarchived" };
    println!("{verb} {}.", call.id);
    Ok(())
}

fn expect_updated(events: Vec<RuntimeEvent>) -> Result<callboard_api::Call> {
    let mut error = None;
    for event in events {
        match event {
            RuntimeEvent::CallUpdated(call) => return Ok(call),
            RuntimeEvent::Error(message) => error = Some(message),
            _ => {}
        }
    }
    bail!("{}", error.unwrap_or_else(|| "no response from server".to_string()))
}
