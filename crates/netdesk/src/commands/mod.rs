//! Command dispatch: bridges CLI args -> console commands -> output formatting.

pub mod addresses;
pub mod config_cmd;
pub mod diagnose;
pub mod policy;
pub mod switches;
pub mod util;

use netdesk_core::HttpConsole;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    console: &HttpConsole,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Switches => switches::list_switches(console, global),
        Command::Ports { switch } => switches::list_ports(console, &switch, global),
        Command::DeletePorts(args) => switches::delete_ports(console, args, global).await,
        Command::Addresses => addresses::handle(console, global),
        Command::Policy(args) => policy::handle(console, args, global).await,
        Command::Diagnose(args) => diagnose::handle(console, args, global).await,
        // Config and Completions never reach a backend
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
