//! Diagnostics session handler.

use serde::Serialize;
use tabled::Tabled;

use netdesk_core::{
    CableReport, ChartConfig, Command as CoreCommand, DiscoveredDevice, HttpConsole, PortId,
    SwitchId, Tab, TabPayload,
};

use crate::cli::{DiagnoseArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// Everything one `diagnose` run produced.
#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    switch: SwitchId,
    port: PortId,
    tab: Tab,
    chart: ChartConfig,
    tab_data: Option<&'a TabPayload>,
    cable_test: Option<&'a CableReport>,
    devices: Option<&'a [DiscoveredDevice]>,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "Pair")]
    pair: u8,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Length (m)")]
    length: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "VLAN")]
    vlan: u16,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Leases")]
    leases: String,
}

impl From<&DiscoveredDevice> for DeviceRow {
    fn from(d: &DiscoveredDevice) -> Self {
        let leases = d
            .leases
            .iter()
            .map(|l| match l.hostname {
                Some(ref host) => format!("{} {host} ({})", l.address, l.uptime),
                None => format!("{} ({})", l.address, l.uptime),
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            vlan: d.vlan,
            mac: d.mac.to_string(),
            vendor: d.vendor.clone().unwrap_or_else(|| "-".into()),
            leases,
        }
    }
}

fn detail(r: &DiagnosticsReport<'_>) -> String {
    let mut sections = vec![format!(
        "Switch {}, port {}\nTab: {}  Chart: {} over {}{}",
        r.switch,
        r.port,
        r.tab,
        r.chart.kind,
        r.chart.interval.as_ref(),
        if r.chart.realtime { " (realtime)" } else { "" }
    )];
    if let Some(data) = r.tab_data {
        sections.push(format!("Data: {}", data.body));
    }
    if let Some(report) = r.cable_test {
        let rows: Vec<PairRow> = report
            .pairs
            .iter()
            .map(|p| PairRow {
                pair: p.pair,
                status: p.status.to_string(),
                length: p.length_m.map_or_else(|| "-".into(), |m| format!("{m:.1}")),
            })
            .collect();
        sections.push(format!(
            "Cable test ({}){}\n{}",
            report.category,
            if report.has_fault() { ": FAULT" } else { "" },
            output::render_table(&rows)
        ));
    }
    if let Some(devices) = r.devices {
        let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
        sections.push(format!("Devices\n{}", output::render_table(&rows)));
    }
    sections.join("\n\n")
}

pub async fn handle(
    console: &HttpConsole,
    args: DiagnoseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = console.state();
    let switch = util::resolve_switch(&state, &args.switch)?;
    let port = util::resolve_port(&state, switch, args.port)?;
    let defaults = console.settings().chart_defaults;

    let mut commands = vec![CoreCommand::OpenDiagnostics {
        switch: Some(switch),
        port: Some(port),
    }];
    if let Some(kind) = args.chart.filter(|k| *k != defaults.kind) {
        commands.push(CoreCommand::SetChartKind { kind });
    }
    if let Some(interval) = args.interval.filter(|i| *i != defaults.interval) {
        commands.push(CoreCommand::SetInterval { interval });
    }
    if args.realtime && !defaults.realtime {
        commands.push(CoreCommand::ToggleRealtime);
    }
    // Chart setters do not reload; re-selecting the tab does, with the
    // chart configuration now in place.
    commands.push(CoreCommand::ChangeTab {
        tab: args.tab.unwrap_or_default(),
    });
    if args.cable_test {
        commands.push(CoreCommand::RunCableTest);
    }
    if args.devices {
        commands.push(CoreCommand::DiscoverDevices);
    }
    for command in commands {
        console.execute(command).await?;
    }

    let state = console.wait_idle().await?;
    if let Some(session) = state.diagnostics() {
        let report = DiagnosticsReport {
            switch,
            port,
            tab: session.tab(),
            chart: session.chart(),
            tab_data: session.tab_data().value(),
            cable_test: session.cable_test().value(),
            devices: session.discovery().value().map(Vec::as_slice),
        };
        let out = output::render_single(global.output, &report, detail, |r| {
            r.tab_data.map(|d| d.body.to_string()).unwrap_or_default()
        })?;
        output::print_output(&out, global.quiet);
    }

    // Failed loads surface as notices; report them after whatever did load.
    util::report_notices(console, global).await?;
    console.execute(CoreCommand::CloseDiagnostics).await?;
    Ok(())
}
