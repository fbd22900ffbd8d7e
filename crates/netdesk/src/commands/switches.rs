//! Switch and port command handlers.

use tabled::Tabled;

use netdesk_core::{Command as CoreCommand, HttpConsole, Port, Switch};

use crate::cli::{DeletePortsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

impl From<&Switch> for SwitchRow {
    fn from(s: &Switch) -> Self {
        let rollup = s.rollup();
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            location: s.location.clone(),
            model: s.model.clone(),
            ports: format!("{}/{}", rollup.active, rollup.total),
        }
    }
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "#")]
    number: u16,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Device")]
    device: String,
}

fn port_row(p: &Port, color: bool) -> PortRow {
    PortRow {
        id: p.id.to_string(),
        number: p.number,
        status: output::port_status(p.status, color),
        speed: p.speed.clone(),
        device: p.device.clone().unwrap_or_else(|| "-".into()),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn list_switches(console: &HttpConsole, global: &GlobalOpts) -> Result<(), CliError> {
    let state = console.state();
    let summary = state.summary();
    let out = output::render_list(
        global.output,
        state.inventory().switches(),
        |s| SwitchRow::from(s),
        |s| s.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    if !global.quiet && matches!(global.output, OutputFormat::Table) {
        let vlan = summary.vlan.map_or_else(|| "-".into(), |v| v.to_string());
        eprintln!(
            "VLAN {vlan}: {} switches, {} active ports",
            summary.switch_count, summary.active_ports
        );
    }
    Ok(())
}

pub fn list_ports(console: &HttpConsole, switch: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let state = console.state();
    let id = util::resolve_switch(&state, switch)?;
    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        state.inventory().ports_of(id),
        |p| port_row(p, color),
        |p| p.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn delete_ports(
    console: &HttpConsole,
    args: DeletePortsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = console.state();
    let switch = util::resolve_switch(&state, &args.switch)?;
    let ports = args
        .ports
        .iter()
        .map(|&number| util::resolve_port(&state, switch, number))
        .collect::<Result<Vec<_>, _>>()?;

    let numbers = args
        .ports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if !util::confirm(
        &format!("Delete port(s) {numbers} on switch {}?", args.switch),
        "delete-ports",
        global.yes,
    )? {
        return Ok(());
    }

    // A repeated number would toggle its port back off.
    let mut unique = ports;
    unique.sort_unstable();
    unique.dedup();
    for port in unique {
        console.execute(CoreCommand::TogglePort { port }).await?;
    }
    console
        .execute(CoreCommand::DeleteSelectedPorts { switch })
        .await?;
    util::settle(console, global).await?;

    if !global.quiet {
        eprintln!("Deleted port(s) {numbers}");
    }
    Ok(())
}
