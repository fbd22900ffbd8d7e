//! Connection policy handlers.

use netdesk_core::{
    Command as CoreCommand, ConnectionPolicy, HttpConsole, InternetAccess, SpeedTier,
};

use crate::cli::{GlobalOpts, PolicyArgs, PolicyCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(p: &ConnectionPolicy) -> String {
    let caps = p.active_caps().map_or_else(
        || "- (internet closed)".into(),
        |c| {
            format!(
                "{} Mbps in / {} Mbps out",
                c.incoming.mbps(),
                c.outgoing.mbps()
            )
        },
    );
    let auto_block = p
        .auto_block
        .evidence()
        .map_or_else(|| "none".into(), |e| format!("SMTP {e}"));
    [
        format!("DHCP:         {}", p.dhcp_mode),
        format!("Distribution: {}", p.distribution),
        format!("Internet:     {}", p.internet),
        format!("Bandwidth:    {caps}"),
        format!("Auto-block:   {auto_block}"),
    ]
    .join("\n")
}

fn tier(field: &str, mbps: u32) -> Result<SpeedTier, CliError> {
    SpeedTier::from_mbps(mbps).ok_or_else(|| CliError::Validation {
        field: field.into(),
        reason: format!("{mbps} Mbps is not a tier (10, 50, 100, 500, 1000)"),
    })
}

pub async fn handle(
    console: &HttpConsole,
    args: PolicyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let commands = match args.command {
        PolicyCommand::Show => {
            let state = console.state();
            let out = output::render_single(
                global.output,
                state.policy(),
                detail,
                |p| p.internet.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        PolicyCommand::Dhcp { mode } => vec![CoreCommand::SetDhcpMode { mode }],
        PolicyCommand::Distribution { mode } => vec![CoreCommand::SetDistributionMode { mode }],
        PolicyCommand::Internet {
            access,
            incoming,
            outgoing,
        } => {
            if access == InternetAccess::Closed && (incoming.is_some() || outgoing.is_some()) {
                return Err(CliError::Validation {
                    field: "internet".into(),
                    reason: "bandwidth caps need internet access open".into(),
                });
            }
            let mut commands = vec![CoreCommand::SetInternetAccess { access }];
            if let Some(mbps) = incoming {
                commands.push(CoreCommand::SetIncomingSpeed {
                    tier: tier("incoming", mbps)?,
                });
            }
            if let Some(mbps) = outgoing {
                commands.push(CoreCommand::SetOutgoingSpeed {
                    tier: tier("outgoing", mbps)?,
                });
            }
            commands
        }
        PolicyCommand::CancelAutoBlock => vec![CoreCommand::CancelAutoBlock],
    };

    for command in commands {
        console.execute(command).await?;
    }
    let state = util::settle(console, global).await?;

    let out = output::render_single(global.output, state.policy(), detail, |p| {
        p.internet.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
