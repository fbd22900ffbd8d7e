// ── IP-level connection policy ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::error::CoreError;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DhcpMode {
    #[default]
    Auto,
    AutoManual,
    Manual,
}

/// How addresses are handed out on the connection point.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistributionMode {
    /// One shared address, no lease tracking; the last device to connect
    /// takes it.
    #[default]
    Simple,
    /// Pooled addresses with lease expiry.
    Advanced,
}

impl DistributionMode {
    pub fn tracks_leases(self) -> bool {
        matches!(self, Self::Advanced)
    }

    /// Simple mode hands the same address to whichever device connected
    /// last, so two devices online at once will fight over it. The console
    /// reports this and leaves resolution to the provisioning backend.
    pub fn conflicts_under_concurrency(self) -> bool {
        matches!(self, Self::Simple)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InternetAccess {
    #[default]
    Closed,
    Open,
}

/// Bandwidth cap tier, in megabits per second.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
)]
#[serde(into = "u32", try_from = "u32")]
pub enum SpeedTier {
    Mbps10,
    Mbps50,
    Mbps100,
    Mbps500,
    Mbps1000,
}

impl SpeedTier {
    pub fn mbps(self) -> u32 {
        match self {
            Self::Mbps10 => 10,
            Self::Mbps50 => 50,
            Self::Mbps100 => 100,
            Self::Mbps500 => 500,
            Self::Mbps1000 => 1000,
        }
    }

    pub fn from_mbps(mbps: u32) -> Option<Self> {
        match mbps {
            10 => Some(Self::Mbps10),
            50 => Some(Self::Mbps50),
            100 => Some(Self::Mbps100),
            500 => Some(Self::Mbps500),
            1000 => Some(Self::Mbps1000),
            _ => None,
        }
    }
}

impl From<SpeedTier> for u32 {
    fn from(tier: SpeedTier) -> Self {
        tier.mbps()
    }
}

impl TryFrom<u32> for SpeedTier {
    type Error = String;

    fn try_from(mbps: u32) -> Result<Self, Self::Error> {
        Self::from_mbps(mbps).ok_or_else(|| format!("{mbps} Mbit/s is not a bandwidth tier"))
    }
}

impl std::fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Mbit/s", self.mbps())
    }
}

impl std::str::FromStr for SpeedTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .trim_end_matches("Mbit/s")
            .trim_end_matches("mbps")
            .trim();
        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::from_mbps)
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "{s:?} is not a bandwidth tier (10, 50, 100, 500, 1000)"
                ))
            })
    }
}

/// Incoming/outgoing caps. Only enforced while access is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthCaps {
    pub incoming: SpeedTier,
    pub outgoing: SpeedTier,
}

impl Default for BandwidthCaps {
    fn default() -> Self {
        Self {
            incoming: SpeedTier::Mbps100,
            outgoing: SpeedTier::Mbps100,
        }
    }
}

// ── Auto-block ──────────────────────────────────────────────────────

/// What the enforcement side saw when it engaged a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBlockEvidence {
    pub observed_at: DateTime<Utc>,
    pub source: IpAddr,
    pub packets: u32,
    pub window_secs: u32,
}

impl AutoBlockEvidence {
    /// Packets per second over the sampling window.
    pub fn rate_pps(&self) -> f64 {
        if self.window_secs == 0 {
            return 0.0;
        }
        f64::from(self.packets) / f64::from(self.window_secs)
    }
}

impl std::fmt::Display for AutoBlockEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}: {} pkts by {} sec ({:.2} pps)",
            self.observed_at.format("%d.%m.%Y %-H:%M"),
            self.source,
            self.packets,
            self.window_secs,
            self.rate_pps()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum AutoBlock {
    #[default]
    None,
    /// Outbound SMTP flood detected.
    Smtp(AutoBlockEvidence),
}

impl AutoBlock {
    pub fn is_engaged(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn evidence(&self) -> Option<&AutoBlockEvidence> {
        match self {
            Self::None => None,
            Self::Smtp(evidence) => Some(evidence),
        }
    }
}

// ── ConnectionPolicy ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPolicy {
    pub dhcp_mode: DhcpMode,
    pub distribution: DistributionMode,
    pub internet: InternetAccess,
    /// Kept while access is closed so re-opening restores them.
    pub caps: BandwidthCaps,
    pub auto_block: AutoBlock,
}

impl ConnectionPolicy {
    /// Caps in force, `None` while internet access is closed.
    pub fn active_caps(&self) -> Option<BandwidthCaps> {
        match self.internet {
            InternetAccess::Open => Some(self.caps),
            InternetAccess::Closed => None,
        }
    }

    pub fn set_dhcp_mode(&mut self, mode: DhcpMode) {
        self.dhcp_mode = mode;
    }

    pub fn set_distribution(&mut self, mode: DistributionMode) {
        self.distribution = mode;
    }

    pub fn set_internet_access(&mut self, access: InternetAccess) {
        self.internet = access;
    }

    pub fn set_incoming(&mut self, tier: SpeedTier) -> Result<(), CoreError> {
        self.require_open("incoming")?;
        self.caps.incoming = tier;
        Ok(())
    }

    pub fn set_outgoing(&mut self, tier: SpeedTier) -> Result<(), CoreError> {
        self.require_open("outgoing")?;
        self.caps.outgoing = tier;
        Ok(())
    }

    /// Record a block engaged by the enforcement side. Newer evidence
    /// replaces older.
    pub fn engage_auto_block(&mut self, evidence: AutoBlockEvidence) {
        self.auto_block = AutoBlock::Smtp(evidence);
    }

    /// Operator cancel. Clears the evidence.
    pub fn cancel_auto_block(&mut self) -> Result<(), CoreError> {
        if !self.auto_block.is_engaged() {
            return Err(CoreError::validation("no auto-block is engaged"));
        }
        self.auto_block = AutoBlock::None;
        Ok(())
    }

    fn require_open(&self, direction: &str) -> Result<(), CoreError> {
        if self.internet == InternetAccess::Closed {
            return Err(CoreError::validation(format!(
                "cannot set the {direction} cap while internet access is closed"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn evidence() -> AutoBlockEvidence {
        AutoBlockEvidence {
            observed_at: Utc.with_ymd_and_hms(2021, 5, 31, 3, 43, 0).unwrap(),
            source: "91.219.24.200".parse().unwrap(),
            packets: 35,
            window_secs: 60,
        }
    }

    #[test]
    fn caps_inactive_while_closed_but_preserved() {
        let mut policy = ConnectionPolicy::default();
        policy.set_internet_access(InternetAccess::Open);
        policy.set_incoming(SpeedTier::Mbps500).unwrap();
        assert_eq!(policy.active_caps().unwrap().incoming, SpeedTier::Mbps500);

        policy.set_internet_access(InternetAccess::Closed);
        assert!(policy.active_caps().is_none());
        assert_eq!(policy.caps.incoming, SpeedTier::Mbps500);

        policy.set_internet_access(InternetAccess::Open);
        assert_eq!(policy.active_caps().unwrap().incoming, SpeedTier::Mbps500);
    }

    #[test]
    fn setting_cap_while_closed_is_rejected() {
        let mut policy = ConnectionPolicy::default();
        let err = policy.set_outgoing(SpeedTier::Mbps10).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(policy.caps.outgoing, SpeedTier::Mbps100);
    }

    #[test]
    fn cancel_clears_evidence() {
        let mut policy = ConnectionPolicy::default();
        assert!(policy.cancel_auto_block().is_err());

        policy.engage_auto_block(evidence());
        assert!(policy.auto_block.is_engaged());
        policy.cancel_auto_block().unwrap();
        assert_eq!(policy.auto_block, AutoBlock::None);
    }

    #[test]
    fn evidence_rate_and_display() {
        let e = evidence();
        assert!((e.rate_pps() - 0.583).abs() < 0.001);
        assert_eq!(
            e.to_string(),
            "31.05.2021 3:43 91.219.24.200: 35 pkts by 60 sec (0.58 pps)"
        );
    }

    #[test]
    fn tier_parsing() {
        assert_eq!("500".parse::<SpeedTier>().unwrap(), SpeedTier::Mbps500);
        assert_eq!("50 Mbit/s".parse::<SpeedTier>().unwrap(), SpeedTier::Mbps50);
        assert!("250".parse::<SpeedTier>().is_err());
    }

    #[test]
    fn dhcp_mode_names() {
        assert_eq!(DhcpMode::AutoManual.to_string(), "auto-manual");
        assert_eq!("manual".parse::<DhcpMode>().unwrap(), DhcpMode::Manual);
    }

    #[test]
    fn simple_mode_documents_conflicts() {
        assert!(DistributionMode::Simple.conflicts_under_concurrency());
        assert!(!DistributionMode::Advanced.conflicts_under_concurrency());
        assert!(DistributionMode::Advanced.tracks_leases());
    }
}
