//! Clap derive structures for the `netdesk` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use netdesk_core::{ChartKind, DhcpMode, DistributionMode, InternetAccess, Tab, TimeInterval};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netdesk -- operator console for switch ports and connection policy
#[derive(Debug, Parser)]
#[command(
    name = "netdesk",
    version,
    about = "Operate switch ports, IP addresses and connection policy from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "NETDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL (overrides config)
    #[arg(long, short = 'u', env = "NETDESK_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token (overrides config)
    #[arg(long, env = "NETDESK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List switches with port rollups
    #[command(alias = "sw")]
    Switches,

    /// List the ports of one switch
    Ports {
        /// Switch ID or name
        switch: String,
    },

    /// Show the IP-level address table
    #[command(alias = "addr")]
    Addresses,

    /// Show or change the connection policy
    Policy(PolicyArgs),

    /// Open a diagnostics session on one port and print its results
    #[command(alias = "diag")]
    Diagnose(DiagnoseArgs),

    /// Delete ports from a switch
    DeletePorts(DeletePortsArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Policy ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Show the current policy
    Show,

    /// Set the DHCP mode (auto, auto-manual, manual)
    Dhcp { mode: DhcpMode },

    /// Set the address distribution mode (simple, advanced)
    Distribution { mode: DistributionMode },

    /// Open or close internet access, optionally setting bandwidth caps
    Internet {
        /// open or closed
        access: InternetAccess,

        /// Incoming cap in Mbps (10, 50, 100, 500, 1000)
        #[arg(long)]
        incoming: Option<u32>,

        /// Outgoing cap in Mbps (10, 50, 100, 500, 1000)
        #[arg(long)]
        outgoing: Option<u32>,
    },

    /// Lift an engaged SMTP auto-block
    CancelAutoBlock,
}

// ── Diagnostics ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiagnoseArgs {
    /// Switch ID or name
    #[arg(long, short = 's')]
    pub switch: String,

    /// Port number on that switch
    #[arg(long, short = 'p')]
    pub port: u16,

    /// Tab to load (graph, diagnostics)
    #[arg(long)]
    pub tab: Option<Tab>,

    /// Chart kind (link, traffic, unicast, broadcast, errors)
    #[arg(long)]
    pub chart: Option<ChartKind>,

    /// Chart window (5m, 10m, 30m, 1h, 6h, 1d)
    #[arg(long)]
    pub interval: Option<TimeInterval>,

    /// Enable realtime charting
    #[arg(long)]
    pub realtime: bool,

    /// Run a cable test
    #[arg(long)]
    pub cable_test: bool,

    /// Discover devices behind the port
    #[arg(long)]
    pub devices: bool,
}

#[derive(Debug, Args)]
pub struct DeletePortsArgs {
    /// Switch ID or name
    #[arg(long, short = 's')]
    pub switch: String,

    /// Port numbers to delete
    #[arg(required = true, num_args = 1..)]
    pub ports: Vec<u16>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Show the effective configuration (token redacted)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
