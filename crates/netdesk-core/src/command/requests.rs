// ── Typed payloads for Command / Effect variants ──

use serde::{Deserialize, Serialize};

use crate::model::{PortId, SpeedSetting, SwitchId};

// ── Port reconfiguration ───────────────────────────────────────────

/// Changes applied to every port of a batch. Unset fields stay as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconfigureParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<SpeedSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

impl ReconfigureParams {
    pub fn is_empty(&self) -> bool {
        self.speed.is_none() && self.enabled.is_none() && self.vlan.is_none()
    }
}

// ── Acknowledgements ───────────────────────────────────────────────

/// What the provisioning side returned for a tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationAck {
    SwitchAdded(SwitchId),
    PortAdded(PortId),
    Completed,
}
