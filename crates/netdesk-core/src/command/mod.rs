// ── Command API ──
//
// Every change to the console flows through a `Command`: operator intents
// from the presentation layer, and settlements the runtime feeds back once
// a collaborator answers. `ConsoleState::apply` turns each one into a new
// state plus a list of `Effect`s.

pub mod effect;
pub mod requests;

use std::net::IpAddr;

use crate::error::{CollaboratorError, CoreError};
use crate::model::{
    AutoBlockEvidence, CableReport, ChartKind, DhcpMode, DiscoveredDevice, DistributionMode,
    IntervalStep, InternetAccess, LinkState, MacAddress, PortId, SiteSnapshot, SpeedSetting,
    SpeedTier, SwitchId, Tab, TabPayload, TimeInterval,
};
use crate::session::{RequestToken, SessionId};
use crate::state::Notice;

pub use effect::Effect;
pub use requests::{OperationAck, ReconfigureParams};

/// Messages accepted by the runtime's command processor.
pub(crate) enum CommandEnvelope {
    /// An operator command; the result goes back on `response_tx`.
    Execute {
        command: Command,
        response_tx: tokio::sync::oneshot::Sender<Result<(), CoreError>>,
    },
    /// A collaborator answer produced by an effect task.
    Settle(Command),
    TakeNotices {
        response_tx: tokio::sync::oneshot::Sender<Vec<Notice>>,
    },
}

#[derive(Debug, Clone)]
pub enum Command {
    // ── Selection ────────────────────────────────────────────────────
    TogglePort {
        port: PortId,
    },
    ToggleAll {
        switch: SwitchId,
    },
    ClearSelection {
        switch: SwitchId,
    },

    // ── Disclosure ───────────────────────────────────────────────────
    ToggleSwitchExpanded {
        switch: SwitchId,
    },
    ToggleAddressTable,
    ToggleAddressExpanded {
        address: IpAddr,
    },

    // ── Provisioning ─────────────────────────────────────────────────
    Refresh,
    AddSwitch,
    AddPort {
        switch: SwitchId,
    },
    DeleteSelectedPorts {
        switch: SwitchId,
    },
    ReconfigureSelectedPorts {
        switch: SwitchId,
        params: ReconfigureParams,
    },
    SetPortStatus {
        port: PortId,
        state: LinkState,
    },
    SetPortSpeed {
        port: PortId,
        speed: SpeedSetting,
    },

    // ── Policy ───────────────────────────────────────────────────────
    SetDhcpMode {
        mode: DhcpMode,
    },
    SetDistributionMode {
        mode: DistributionMode,
    },
    SetInternetAccess {
        access: InternetAccess,
    },
    SetIncomingSpeed {
        tier: SpeedTier,
    },
    SetOutgoingSpeed {
        tier: SpeedTier,
    },
    CancelAutoBlock,

    // ── Address table / connection point ─────────────────────────────
    BindMac {
        address: IpAddr,
        mac: MacAddress,
    },
    UnbindMac {
        address: IpAddr,
    },
    SetAddressDescription {
        address: IpAddr,
        description: String,
    },
    UpdateConnectionDescription {
        description: String,
    },

    // ── Diagnostics ──────────────────────────────────────────────────
    OpenDiagnostics {
        switch: Option<SwitchId>,
        port: Option<PortId>,
    },
    CloseDiagnostics,
    SelectSwitch {
        switch: SwitchId,
    },
    SelectPort {
        port: PortId,
    },
    ChangeTab {
        tab: Tab,
    },
    SetChartKind {
        kind: ChartKind,
    },
    ToggleRealtime,
    StepInterval {
        step: IntervalStep,
    },
    SetInterval {
        interval: TimeInterval,
    },
    RunCableTest,
    DiscoverDevices,

    // ── Settlements ──────────────────────────────────────────────────
    SnapshotLoaded {
        token: RequestToken,
        outcome: Result<SiteSnapshot, CollaboratorError>,
    },
    OperationSettled {
        token: RequestToken,
        outcome: Result<OperationAck, CollaboratorError>,
    },
    TabDataLoaded {
        session: SessionId,
        token: RequestToken,
        outcome: Result<TabPayload, CollaboratorError>,
    },
    CableTestFinished {
        session: SessionId,
        token: RequestToken,
        outcome: Result<CableReport, CollaboratorError>,
    },
    DevicesDiscovered {
        session: SessionId,
        token: RequestToken,
        outcome: Result<Vec<DiscoveredDevice>, CollaboratorError>,
    },
    PortStatusApplied {
        port: PortId,
        token: RequestToken,
        outcome: Result<LinkState, CollaboratorError>,
    },
    PortSpeedApplied {
        port: PortId,
        token: RequestToken,
        outcome: Result<SpeedSetting, CollaboratorError>,
    },
    /// Evidence pushed or polled from the enforcement side.
    AutoBlockObserved {
        evidence: AutoBlockEvidence,
    },
    /// The enforcement side could not be polled.
    AutoBlockPollFailed {
        error: CollaboratorError,
    },
}

impl Command {
    /// Settlements come from collaborators, never from the operator.
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            Self::SnapshotLoaded { .. }
                | Self::OperationSettled { .. }
                | Self::TabDataLoaded { .. }
                | Self::CableTestFinished { .. }
                | Self::DevicesDiscovered { .. }
                | Self::PortStatusApplied { .. }
                | Self::PortSpeedApplied { .. }
                | Self::AutoBlockObserved { .. }
                | Self::AutoBlockPollFailed { .. }
        )
    }
}
