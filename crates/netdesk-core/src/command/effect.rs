// ── Side-effect descriptors ──
//
// Requests for collaborators, produced by `ConsoleState::apply`. The state
// performs no I/O; the runtime (or a test) executes these and reports the
// outcome back as a settlement `Command` carrying the same token.

use std::net::IpAddr;

use super::requests::ReconfigureParams;
use crate::model::{
    AddressEntry, ChartConfig, ConnectionPoint, ConnectionPolicy, LinkState, PortId,
    SpeedSetting, SwitchId, Tab,
};
use crate::session::{RequestToken, SessionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    // ── Provisioning ─────────────────────────────────────────────────
    FetchSnapshot {
        token: RequestToken,
    },
    AddSwitch {
        token: RequestToken,
    },
    AddPort {
        token: RequestToken,
        switch: SwitchId,
    },
    DeletePorts {
        token: RequestToken,
        ports: Vec<PortId>,
    },
    ReconfigurePorts {
        token: RequestToken,
        ports: Vec<PortId>,
        params: ReconfigureParams,
    },
    ApplyPolicy {
        token: RequestToken,
        policy: ConnectionPolicy,
    },
    UpdateAddress {
        token: RequestToken,
        address: IpAddr,
        entry: AddressEntry,
    },
    UpdateConnection {
        token: RequestToken,
        connection: ConnectionPoint,
    },

    // ── Telemetry ────────────────────────────────────────────────────
    LoadTabData {
        session: SessionId,
        token: RequestToken,
        switch: SwitchId,
        port: PortId,
        tab: Tab,
        chart: ChartConfig,
    },
    RunCableTest {
        session: SessionId,
        token: RequestToken,
        switch: SwitchId,
        port: PortId,
    },
    DiscoverDevices {
        session: SessionId,
        token: RequestToken,
        switch: SwitchId,
        port: PortId,
    },
    SetPortStatus {
        token: RequestToken,
        port: PortId,
        state: LinkState,
    },
    SetPortSpeed {
        token: RequestToken,
        port: PortId,
        speed: SpeedSetting,
    },
}

impl Effect {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchSnapshot { .. } => "fetch-snapshot",
            Self::AddSwitch { .. } => "add-switch",
            Self::AddPort { .. } => "add-port",
            Self::DeletePorts { .. } => "delete-ports",
            Self::ReconfigurePorts { .. } => "reconfigure-ports",
            Self::ApplyPolicy { .. } => "apply-policy",
            Self::UpdateAddress { .. } => "update-address",
            Self::UpdateConnection { .. } => "update-connection",
            Self::LoadTabData { .. } => "load-tab-data",
            Self::RunCableTest { .. } => "cable-test",
            Self::DiscoverDevices { .. } => "discover-devices",
            Self::SetPortStatus { .. } => "set-port-status",
            Self::SetPortSpeed { .. } => "set-port-speed",
        }
    }
}
