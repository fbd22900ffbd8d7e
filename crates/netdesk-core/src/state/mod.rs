// ── Console state ──
//
// The single read model the presentation layer renders, and the single
// place commands are applied. `apply` works on a copy and commits it only
// when the command succeeds, so a rejected command never leaves a partial
// change behind. Nothing in here performs I/O.

mod diagnostics;
mod operations;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use crate::command::{Command, Effect};
use crate::error::{CollaboratorError, CoreError};
use crate::model::{
    AddressTable, ChartConfig, ConnectionPoint, ConnectionPolicy, ConnectionSummary, Inventory,
    LinkState, Port, PortId, PortRollup, SpeedSetting, SwitchId,
};
use crate::selection::{SelectAllState, SelectionSet};
use crate::session::slot::TokenCounter;
use crate::session::{AsyncSlot, DiagnosticsSession, RequestToken, SessionTokens};

// ── Notices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Something the operator should see: a failed collaborator call, a
/// session closed underneath them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub(crate) fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub(crate) fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

// ── Disclosure ──────────────────────────────────────────────────────

/// Which parts of the console are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disclosure {
    expanded_switches: BTreeSet<SwitchId>,
    address_table_shown: bool,
    expanded_addresses: BTreeSet<IpAddr>,
    #[serde(skip)]
    seeded: bool,
}

impl Default for Disclosure {
    fn default() -> Self {
        Self {
            expanded_switches: BTreeSet::new(),
            address_table_shown: true,
            expanded_addresses: BTreeSet::new(),
            seeded: false,
        }
    }
}

impl Disclosure {
    pub fn is_switch_expanded(&self, switch: SwitchId) -> bool {
        self.expanded_switches.contains(&switch)
    }

    pub fn is_address_table_shown(&self) -> bool {
        self.address_table_shown
    }

    pub fn is_address_expanded(&self, address: IpAddr) -> bool {
        self.expanded_addresses.contains(&address)
    }

    fn toggle_switch(&mut self, switch: SwitchId) {
        if !self.expanded_switches.remove(&switch) {
            self.expanded_switches.insert(switch);
        }
    }

    fn toggle_address(&mut self, address: IpAddr) {
        if !self.expanded_addresses.remove(&address) {
            self.expanded_addresses.insert(address);
        }
    }

    /// Prune entries that no longer exist; the first snapshot expands the
    /// first switch.
    fn reconcile(&mut self, inventory: &Inventory, addresses: &AddressTable) {
        self.expanded_switches
            .retain(|s| inventory.find_switch(*s).is_some());
        self.expanded_addresses.retain(|a| addresses.contains(*a));
        if !self.seeded {
            if let Some(first) = inventory.switches().first() {
                self.expanded_switches.insert(first.id);
            }
            self.seeded = true;
        }
    }
}

// ── Per-port controls ───────────────────────────────────────────────

/// Link and speed changes in flight for one port, each with its own token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortControl {
    status: AsyncSlot<LinkState>,
    speed: AsyncSlot<SpeedSetting>,
}

impl PortControl {
    pub fn status(&self) -> &AsyncSlot<LinkState> {
        &self.status
    }

    pub fn speed(&self) -> &AsyncSlot<SpeedSetting> {
        &self.speed
    }

    fn is_busy(&self) -> bool {
        self.status.is_loading() || self.speed.is_loading()
    }
}

// ── Pending operations ──────────────────────────────────────────────

/// A provisioning or sync call awaiting its acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum PendingOperation {
    AddSwitch,
    AddPort { switch: SwitchId },
    DeletePorts { switch: SwitchId, ports: Vec<PortId> },
    ReconfigurePorts { switch: SwitchId, ports: Vec<PortId> },
    ApplyPolicy,
    UpdateAddress { address: IpAddr },
    UpdateConnection,
}

impl PendingOperation {
    /// Sync operations push operator edits already shown in the state; when
    /// one fails the projection no longer matches the backend.
    fn is_sync(&self) -> bool {
        matches!(
            self,
            Self::ApplyPolicy | Self::UpdateAddress { .. } | Self::UpdateConnection
        )
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddSwitch => write!(f, "add switch"),
            Self::AddPort { switch } => write!(f, "add port to switch {switch}"),
            Self::DeletePorts { switch, ports } => {
                write!(f, "delete {} port(s) on switch {switch}", ports.len())
            }
            Self::ReconfigurePorts { switch, ports } => {
                write!(f, "reconfigure {} port(s) on switch {switch}", ports.len())
            }
            Self::ApplyPolicy => write!(f, "apply policy"),
            Self::UpdateAddress { address } => write!(f, "update address {address}"),
            Self::UpdateConnection => write!(f, "update connection point"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tokens {
    snapshot: TokenCounter,
    operation: TokenCounter,
    port_status: TokenCounter,
    port_speed: TokenCounter,
    session: SessionTokens,
}

// ── ConsoleState ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConsoleState {
    inventory: Inventory,
    selection: SelectionSet,
    policy: ConnectionPolicy,
    addresses: AddressTable,
    connection: Option<ConnectionPoint>,
    disclosure: Disclosure,
    diagnostics: Option<DiagnosticsSession>,
    port_controls: BTreeMap<PortId, PortControl>,
    pending: BTreeMap<RequestToken, PendingOperation>,
    /// Sync operations a snapshot landed on top of while in flight.
    overtaken_syncs: BTreeSet<RequestToken>,
    /// Evidence observed at or before this instant was cancelled by the operator.
    auto_block_dismissed: Option<DateTime<Utc>>,
    snapshot: AsyncSlot<()>,
    tokens: Tokens,
    notices: Vec<Notice>,
    chart_defaults: ChartConfig,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

impl ConsoleState {
    /// Empty console. Every diagnostics session starts with `chart_defaults`.
    pub fn new(chart_defaults: ChartConfig) -> Self {
        Self {
            inventory: Inventory::default(),
            selection: SelectionSet::default(),
            policy: ConnectionPolicy::default(),
            addresses: AddressTable::default(),
            connection: None,
            disclosure: Disclosure::default(),
            diagnostics: None,
            port_controls: BTreeMap::new(),
            pending: BTreeMap::new(),
            overtaken_syncs: BTreeSet::new(),
            auto_block_dismissed: None,
            snapshot: AsyncSlot::default(),
            tokens: Tokens::default(),
            notices: Vec::new(),
            chart_defaults,
        }
    }

    // ── Command application ─────────────────────────────────────────

    /// Apply one command. On error the state is exactly as before.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Effect>, CoreError> {
        let mut next = self.clone();
        let effects = next.dispatch(command)?;
        *self = next;
        Ok(effects)
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&mut self, command: Command) -> Result<Vec<Effect>, CoreError> {
        match command {
            // ── Selection ────────────────────────────────────────────
            Command::TogglePort { port } => {
                self.require_port(port)?;
                self.selection.toggle(port);
                Ok(Vec::new())
            }
            Command::ToggleAll { switch } => {
                self.require_switch(switch)?;
                self.selection.toggle_all(&self.inventory, switch);
                Ok(Vec::new())
            }
            Command::ClearSelection { switch } => {
                self.require_switch(switch)?;
                self.selection.clear_for_switch(&self.inventory, switch);
                Ok(Vec::new())
            }

            // ── Disclosure ───────────────────────────────────────────
            Command::ToggleSwitchExpanded { switch } => {
                self.require_switch(switch)?;
                self.disclosure.toggle_switch(switch);
                Ok(Vec::new())
            }
            Command::ToggleAddressTable => {
                self.disclosure.address_table_shown = !self.disclosure.address_table_shown;
                Ok(Vec::new())
            }
            Command::ToggleAddressExpanded { address } => {
                self.require_address(address)?;
                self.disclosure.toggle_address(address);
                Ok(Vec::new())
            }

            // ── Provisioning ─────────────────────────────────────────
            Command::Refresh => Ok(vec![self.start_refresh()]),
            Command::AddSwitch => Ok(vec![self.add_switch()]),
            Command::AddPort { switch } => self.add_port(switch).map(|e| vec![e]),
            Command::DeleteSelectedPorts { switch } => {
                self.delete_selected_ports(switch).map(|e| vec![e])
            }
            Command::ReconfigureSelectedPorts { switch, params } => self
                .reconfigure_selected_ports(switch, params)
                .map(|e| vec![e]),
            Command::SetPortStatus { port, state } => {
                self.set_port_status(port, state).map(|e| vec![e])
            }
            Command::SetPortSpeed { port, speed } => {
                self.set_port_speed(port, speed).map(|e| vec![e])
            }

            // ── Policy ───────────────────────────────────────────────
            Command::SetDhcpMode { mode } => {
                self.policy.set_dhcp_mode(mode);
                Ok(vec![self.sync_policy()])
            }
            Command::SetDistributionMode { mode } => {
                self.policy.set_distribution(mode);
                if mode.conflicts_under_concurrency() {
                    self.notices.push(Notice::info(
                        "simple distribution shares one address: concurrent devices will conflict",
                    ));
                }
                Ok(vec![self.sync_policy()])
            }
            Command::SetInternetAccess { access } => {
                self.policy.set_internet_access(access);
                Ok(vec![self.sync_policy()])
            }
            Command::SetIncomingSpeed { tier } => {
                self.policy.set_incoming(tier)?;
                Ok(vec![self.sync_policy()])
            }
            Command::SetOutgoingSpeed { tier } => {
                self.policy.set_outgoing(tier)?;
                Ok(vec![self.sync_policy()])
            }
            Command::CancelAutoBlock => self.cancel_auto_block().map(|e| vec![e]),

            // ── Address table / connection point ─────────────────────
            Command::BindMac { address, mac } => self.bind_mac(address, mac).map(|e| vec![e]),
            Command::UnbindMac { address } => self.unbind_mac(address).map(|e| vec![e]),
            Command::SetAddressDescription {
                address,
                description,
            } => self
                .set_address_description(address, &description)
                .map(|e| vec![e]),
            Command::UpdateConnectionDescription { description } => self
                .update_connection_description(&description)
                .map(|e| vec![e]),

            // ── Diagnostics ──────────────────────────────────────────
            Command::OpenDiagnostics { switch, port } => self.open_diagnostics(switch, port),
            Command::CloseDiagnostics => {
                self.close_diagnostics();
                Ok(Vec::new())
            }
            Command::SelectSwitch { switch } => self.select_session_switch(switch),
            Command::SelectPort { port } => self.select_session_port(port),
            Command::ChangeTab { tab } => self.change_tab(tab),
            Command::SetChartKind { kind } => {
                self.session_mut()?.set_chart_kind(kind);
                Ok(Vec::new())
            }
            Command::ToggleRealtime => {
                self.session_mut()?.toggle_realtime();
                Ok(Vec::new())
            }
            Command::StepInterval { step } => {
                self.session_mut()?.step_interval(step);
                Ok(Vec::new())
            }
            Command::SetInterval { interval } => {
                self.session_mut()?.set_interval(interval);
                Ok(Vec::new())
            }
            Command::RunCableTest => self.run_cable_test().map(|e| vec![e]),
            Command::DiscoverDevices => self.discover_devices().map(|e| vec![e]),

            // ── Settlements ──────────────────────────────────────────
            Command::SnapshotLoaded { token, outcome } => Ok(self.snapshot_loaded(token, outcome)),
            Command::OperationSettled { token, outcome } => {
                Ok(self.operation_settled(token, outcome))
            }
            Command::TabDataLoaded {
                session,
                token,
                outcome,
            } => {
                self.tab_data_loaded(session, token, outcome);
                Ok(Vec::new())
            }
            Command::CableTestFinished {
                session,
                token,
                outcome,
            } => {
                self.cable_test_finished(session, token, outcome);
                Ok(Vec::new())
            }
            Command::DevicesDiscovered {
                session,
                token,
                outcome,
            } => {
                self.devices_discovered(session, token, outcome);
                Ok(Vec::new())
            }
            Command::PortStatusApplied {
                port,
                token,
                outcome,
            } => {
                self.port_status_applied(port, token, outcome);
                Ok(Vec::new())
            }
            Command::PortSpeedApplied {
                port,
                token,
                outcome,
            } => {
                self.port_speed_applied(port, token, outcome);
                Ok(Vec::new())
            }
            Command::AutoBlockObserved { evidence } => {
                self.auto_block_observed(evidence);
                Ok(Vec::new())
            }
            Command::AutoBlockPollFailed { error } => {
                self.fail("auto-block poll", &error);
                Ok(Vec::new())
            }
        }
    }

    // ── Lookups that reject ─────────────────────────────────────────

    fn require_switch(&self, switch: SwitchId) -> Result<(), CoreError> {
        self.inventory
            .find_switch(switch)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("switch", switch))
    }

    fn require_port(&self, port: PortId) -> Result<(), CoreError> {
        self.inventory
            .find_port(port)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("port", port))
    }

    fn require_address(&self, address: IpAddr) -> Result<(), CoreError> {
        self.addresses
            .find(address)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("address", address))
    }

    fn fail(&mut self, what: &str, err: &CollaboratorError) {
        tracing::warn!(operation = what, error = %err, "collaborator call failed");
        self.notices
            .push(Notice::warning(format!("{what} failed: {err}")));
    }

    // ── Read model ──────────────────────────────────────────────────

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn is_all_selected(&self, switch: SwitchId) -> bool {
        self.selection.is_all_selected(&self.inventory, switch)
    }

    pub fn is_partially_selected(&self, switch: SwitchId) -> bool {
        self.selection.is_partially_selected(&self.inventory, switch)
    }

    pub fn count_selected(&self, switch: SwitchId) -> usize {
        self.selection.count_selected(&self.inventory, switch)
    }

    pub fn select_all_state(&self, switch: SwitchId) -> SelectAllState {
        self.selection.state(&self.inventory, switch)
    }

    pub fn rollup(&self, switch: SwitchId) -> Option<PortRollup> {
        self.inventory.find_switch(switch).map(crate::model::Switch::rollup)
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    pub fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    pub fn connection(&self) -> Option<&ConnectionPoint> {
        self.connection.as_ref()
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            vlan: self.connection.as_ref().map(|c| c.vlan.clone()),
            description: self.connection.as_ref().map(|c| c.description.clone()),
            switch_count: self.inventory.switch_count(),
            active_ports: self.inventory.active_port_count(),
        }
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn diagnostics(&self) -> Option<&DiagnosticsSession> {
        self.diagnostics.as_ref()
    }

    /// Ports the diagnostics port picker offers; empty without a switch.
    pub fn diagnostics_ports(&self) -> &[Port] {
        self.diagnostics
            .as_ref()
            .map_or(&[], |s| s.available_ports(&self.inventory))
    }

    pub fn port_control(&self, port: PortId) -> Option<&PortControl> {
        self.port_controls.get(&port)
    }

    pub fn pending_operations(&self) -> impl Iterator<Item = (RequestToken, &PendingOperation)> {
        self.pending.iter().map(|(t, op)| (*t, op))
    }

    pub fn is_refreshing(&self) -> bool {
        self.snapshot.is_loading()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.value().is_some()
    }

    pub fn refresh_error(&self) -> Option<&CollaboratorError> {
        self.snapshot.last_error()
    }

    /// No async slot of any kind is waiting on a collaborator.
    pub fn is_idle(&self) -> bool {
        !self.snapshot.is_loading()
            && self.pending.is_empty()
            && !self.diagnostics.as_ref().is_some_and(DiagnosticsSession::is_busy)
            && !self.port_controls.values().any(PortControl::is_busy)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
