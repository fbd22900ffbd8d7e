// ── Domain model ──
//
// Canonical types the console projects from collaborator responses.

pub mod address;
pub mod connection;
pub mod diagnostics;
pub mod entity_id;
pub mod inventory;
pub mod policy;

pub use address::{AddressEntry, AddressStatus, AddressTable};
pub use connection::{ConnectionPoint, ConnectionSummary, VlanNumber};
pub use diagnostics::{
    CableReport, ChartConfig, ChartKind, DiscoveredDevice, IntervalStep, LeaseRecord,
    PairReport, PairStatus, Tab, TabPayload, TimeInterval,
};
pub use entity_id::{MacAddress, PortId, SwitchId};
pub use inventory::{Inventory, LinkState, Port, PortRollup, PortStatus, SpeedSetting, Switch};
pub use policy::{
    AutoBlock, AutoBlockEvidence, BandwidthCaps, ConnectionPolicy, DhcpMode, DistributionMode,
    InternetAccess, SpeedTier,
};

/// Everything one snapshot of the site carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSnapshot {
    pub connection: ConnectionPoint,
    pub inventory: Inventory,
    pub addresses: AddressTable,
    pub policy: ConnectionPolicy,
}
