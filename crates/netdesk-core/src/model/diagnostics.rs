// ── Diagnostics value types ──
//
// Chart configuration and the results the telemetry side hands back for a
// single port. Tab payloads are opaque: the console only cares which tab
// they belong to.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::entity_id::MacAddress;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum Tab {
    #[default]
    Graph,
    Diagnostics,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ChartKind {
    Link,
    #[default]
    Traffic,
    Unicast,
    Broadcast,
    Errors,
}

/// Chart time window. Variants are declared shortest first; stepping
/// clamps at either end.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum TimeInterval {
    #[serde(rename = "5m")]
    #[strum(serialize = "5m")]
    FiveMinutes,
    #[default]
    #[serde(rename = "10m")]
    #[strum(serialize = "10m")]
    TenMinutes,
    #[serde(rename = "30m")]
    #[strum(serialize = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    #[strum(serialize = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    #[strum(serialize = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    #[strum(serialize = "1d")]
    OneDay,
}

const INTERVALS: [TimeInterval; 6] = [
    TimeInterval::FiveMinutes,
    TimeInterval::TenMinutes,
    TimeInterval::ThirtyMinutes,
    TimeInterval::OneHour,
    TimeInterval::SixHours,
    TimeInterval::OneDay,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IntervalStep {
    Shorter,
    Longer,
}

impl TimeInterval {
    pub const MIN: Self = Self::FiveMinutes;
    pub const MAX: Self = Self::OneDay;

    fn position(self) -> usize {
        INTERVALS.iter().position(|i| *i == self).unwrap_or(0)
    }

    /// Next shorter window, or `self` at the minimum.
    pub fn shorter(self) -> Self {
        self.position()
            .checked_sub(1)
            .and_then(|i| INTERVALS.get(i).copied())
            .unwrap_or(self)
    }

    /// Next longer window, or `self` at the maximum.
    pub fn longer(self) -> Self {
        INTERVALS.get(self.position() + 1).copied().unwrap_or(self)
    }

    pub fn step(self, step: IntervalStep) -> Self {
        match step {
            IntervalStep::Shorter => self.shorter(),
            IntervalStep::Longer => self.longer(),
        }
    }
}

/// What the traffic chart should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub realtime: bool,
    pub interval: TimeInterval,
}

// ── Telemetry results ───────────────────────────────────────────────

/// Content of one tab, as loaded for a specific port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabPayload {
    pub tab: Tab,
    pub body: serde_json::Value,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PairStatus {
    Ok,
    Open,
    Short,
    ImpedanceMismatch,
    Crosstalk,
    Unknown,
}

impl PairStatus {
    pub fn is_fault(self) -> bool {
        !matches!(self, Self::Ok | Self::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub pair: u8,
    pub status: PairStatus,
    /// Cable length, or distance to the fault.
    pub length_m: Option<f32>,
}

/// Outcome of a cable test. Kept whole until the next run replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableReport {
    pub category: String,
    pub pairs: Vec<PairReport>,
}

impl CableReport {
    pub fn has_fault(&self) -> bool {
        self.pairs.iter().any(|p| p.status.is_fault())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub address: IpAddr,
    pub uptime: String,
    pub hostname: Option<String>,
}

/// One endpoint seen behind a port. A single MAC may hold several leases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub vlan: u16,
    pub mac: MacAddress,
    pub vendor: Option<String>,
    pub leases: Vec<LeaseRecord>,
}
