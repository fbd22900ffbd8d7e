// ── Switch / port inventory ──

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::entity_id::{PortId, SwitchId};
use crate::error::CoreError;

/// Observed link status of a port.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PortStatus {
    Active,
    Inactive,
    Blocked,
    Unknown,
}

impl PortStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Administrative link state an operator can push to a port.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LinkState {
    Up,
    Down,
}

impl LinkState {
    /// Status the port is expected to report once the change is acknowledged.
    pub fn resulting_status(self) -> PortStatus {
        match self {
            Self::Up => PortStatus::Active,
            Self::Down => PortStatus::Inactive,
        }
    }
}

/// Speed an operator can force on a port.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum SpeedSetting {
    #[serde(rename = "auto")]
    #[strum(serialize = "auto")]
    Auto,
    #[serde(rename = "10")]
    #[strum(serialize = "10")]
    Mbps10,
    #[serde(rename = "100")]
    #[strum(serialize = "100")]
    Mbps100,
    #[serde(rename = "1000")]
    #[strum(serialize = "1000")]
    Mbps1000,
    #[serde(rename = "10000")]
    #[strum(serialize = "10000")]
    Mbps10000,
}

impl SpeedSetting {
    /// Speed label as the inventory shows it.
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Mbps10 => "10 Mbps",
            Self::Mbps100 => "100 Mbps",
            Self::Mbps1000 => "1 Gbps",
            Self::Mbps10000 => "10 Gbps",
        }
    }
}

// ── Port / Switch ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    /// 1-based ordinal, unique within the owning switch.
    pub number: u16,
    pub status: PortStatus,
    /// Negotiated speed label, e.g. "1 Gbps".
    pub speed: String,
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub id: SwitchId,
    pub name: String,
    pub location: String,
    pub model: String,
    /// Physical port order.
    pub ports: Vec<Port>,
}

/// Active/total port counts for one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRollup {
    pub active: usize,
    pub total: usize,
}

impl Switch {
    pub fn rollup(&self) -> PortRollup {
        PortRollup {
            active: self.ports.iter().filter(|p| p.status.is_active()).count(),
            total: self.ports.len(),
        }
    }

    pub fn has_port(&self, port: PortId) -> bool {
        self.ports.iter().any(|p| p.id == port)
    }
}

// ── Inventory ───────────────────────────────────────────────────────

/// Every switch of the site with its ports, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    switches: Vec<Switch>,
}

impl Inventory {
    /// Build an inventory, rejecting duplicate switch ids, duplicate port
    /// ids anywhere in the site and duplicate port numbers within a switch.
    pub fn new(switches: Vec<Switch>) -> Result<Self, CoreError> {
        let mut switch_ids = HashSet::new();
        let mut port_ids = HashSet::new();

        for switch in &switches {
            if !switch_ids.insert(switch.id) {
                return Err(CoreError::validation(format!(
                    "duplicate switch id {}",
                    switch.id
                )));
            }
            let mut numbers = HashSet::new();
            for port in &switch.ports {
                if !port_ids.insert(port.id) {
                    return Err(CoreError::validation(format!(
                        "port {} appears on more than one switch",
                        port.id
                    )));
                }
                if port.number == 0 || !numbers.insert(port.number) {
                    return Err(CoreError::validation(format!(
                        "switch {} has invalid or duplicate port number {}",
                        switch.id, port.number
                    )));
                }
            }
        }

        Ok(Self { switches })
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Active ports across the whole site.
    pub fn active_port_count(&self) -> usize {
        self.ports().filter(|p| p.status.is_active()).count()
    }

    /// Ports of a switch in physical order; empty for an unknown switch.
    pub fn ports_of(&self, switch: SwitchId) -> &[Port] {
        self.find_switch(switch).map_or(&[], |s| s.ports.as_slice())
    }

    pub fn find_switch(&self, switch: SwitchId) -> Option<&Switch> {
        self.switches.iter().find(|s| s.id == switch)
    }

    pub fn find_port(&self, port: PortId) -> Option<&Port> {
        self.ports().find(|p| p.id == port)
    }

    /// The switch a port belongs to.
    pub fn owner_of(&self, port: PortId) -> Option<SwitchId> {
        self.switches
            .iter()
            .find(|s| s.has_port(port))
            .map(|s| s.id)
    }

    pub fn contains_port(&self, port: PortId) -> bool {
        self.owner_of(port).is_some()
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.switches.iter().flat_map(|s| s.ports.iter())
    }

    pub(crate) fn port_mut(&mut self, port: PortId) -> Option<&mut Port> {
        self.switches
            .iter_mut()
            .flat_map(|s| s.ports.iter_mut())
            .find(|p| p.id == port)
    }

    /// Drop the given ports. Returns the ids that were actually present.
    pub(crate) fn remove_ports(&mut self, ports: &[PortId]) -> Vec<PortId> {
        let mut removed = Vec::new();
        for switch in &mut self.switches {
            switch.ports.retain(|p| {
                if ports.contains(&p.id) {
                    removed.push(p.id);
                    false
                } else {
                    true
                }
            });
        }
        removed
    }
}
