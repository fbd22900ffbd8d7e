//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use netdesk_core::{ConsoleState, HttpConsole, NoticeLevel, PortId, SwitchId};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve a switch identifier (numeric ID or name) against the snapshot.
pub fn resolve_switch(state: &ConsoleState, identifier: &str) -> Result<SwitchId, CliError> {
    let by_id = identifier.parse::<u32>().ok().map(SwitchId::new);
    state
        .inventory()
        .switches()
        .iter()
        .find(|s| Some(s.id) == by_id || s.name.eq_ignore_ascii_case(identifier))
        .map(|s| s.id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "switch".into(),
            identifier: identifier.into(),
            list_command: "switches".into(),
        })
}

/// Resolve a port by its number on `switch`.
pub fn resolve_port(state: &ConsoleState, switch: SwitchId, number: u16) -> Result<PortId, CliError> {
    state
        .inventory()
        .ports_of(switch)
        .iter()
        .find(|p| p.number == number)
        .map(|p| p.id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "port".into(),
            identifier: format!("{number} on switch {switch}"),
            list_command: format!("ports {switch}"),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Wait for every in-flight call to settle, then report notices.
pub async fn settle(
    console: &HttpConsole,
    global: &GlobalOpts,
) -> Result<Arc<ConsoleState>, CliError> {
    let state = console.wait_idle().await?;
    report_notices(console, global).await?;
    Ok(state)
}

/// Print queued notices on stderr. A warning means a collaborator call
/// failed; the first one becomes the command's error.
pub async fn report_notices(console: &HttpConsole, global: &GlobalOpts) -> Result<(), CliError> {
    let mut failure = None;
    for notice in console.take_notices().await? {
        match notice.level {
            NoticeLevel::Info if !global.quiet => eprintln!("{notice}"),
            NoticeLevel::Info => {}
            NoticeLevel::Warning => {
                eprintln!("{notice}");
                failure.get_or_insert(notice.message);
            }
        }
    }
    match failure {
        Some(message) => Err(CliError::OperationFailed { message }),
        None => Ok(()),
    }
}
