// ── API-to-domain type conversions ──
//
// Bridges raw `netdesk_api` wire types into canonical `netdesk_core::model`
// types and back. Inbound conversions parse strings into strong types;
// anything the model cannot represent becomes a `Malformed` collaborator
// error instead of a guess.

use std::net::IpAddr;
use std::str::FromStr;

use netdesk_api::types::{
    AddressDto, AutoBlockDto, CablePairDto, CableTestResponse, ConnectionPointDto,
    DiscoveredDeviceDto, LeaseDto, PolicyDto, PortDto, ReconfigurePortsRequest,
    SiteSnapshotResponse, SwitchDto, TabDataResponse, TelemetryQuery,
};

use crate::command::ReconfigureParams;
use crate::error::CollaboratorError;
use crate::model::{
    AddressEntry, AddressStatus, AddressTable, AutoBlock, AutoBlockEvidence, BandwidthCaps,
    CableReport, ChartConfig, ConnectionPoint, ConnectionPolicy, DiscoveredDevice, Inventory,
    LeaseRecord, MacAddress, PairReport, PairStatus, Port, PortId, PortStatus, SiteSnapshot,
    SpeedTier, Switch, SwitchId, Tab, TabPayload,
};

/// Placeholder the backend renders for "nothing observed".
const NONE_MARKER: &str = "—";

// ── Helpers ────────────────────────────────────────────────────────

fn parse_field<T: FromStr>(field: &str, raw: &str) -> Result<T, CollaboratorError> {
    raw.parse()
        .map_err(|_| CollaboratorError::malformed(format!("unexpected {field}: {raw:?}")))
}

/// Optional text field; blanks and the placeholder mean absent.
fn present(raw: Option<&String>) -> Option<&str> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != NONE_MARKER)
}

/// Parse an optional address. Absent is fine; present but unparseable is not.
fn parse_ip(field: &str, raw: Option<&String>) -> Result<Option<IpAddr>, CollaboratorError> {
    present(raw).map(|s| parse_field(field, s)).transpose()
}

/// DNS servers in priority order; a bad entry fails the whole list.
fn parse_dns(raw: &[String]) -> Result<Vec<IpAddr>, CollaboratorError> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != NONE_MARKER)
        .map(|s| parse_field("DNS server", s))
        .collect()
}

fn parse_mac(raw: Option<&String>) -> Option<MacAddress> {
    present(raw).map(MacAddress::new)
}

fn parse_tier(field: &str, mbps: u32) -> Result<SpeedTier, CollaboratorError> {
    SpeedTier::from_mbps(mbps)
        .ok_or_else(|| CollaboratorError::malformed(format!("unexpected {field}: {mbps} Mbit/s")))
}

// ── Snapshot ───────────────────────────────────────────────────────

impl TryFrom<SiteSnapshotResponse> for SiteSnapshot {
    type Error = CollaboratorError;

    fn try_from(raw: SiteSnapshotResponse) -> Result<Self, Self::Error> {
        let switches = raw
            .switches
            .into_iter()
            .map(Switch::from)
            .collect::<Vec<_>>();
        let inventory =
            Inventory::new(switches).map_err(|e| CollaboratorError::malformed(e.to_string()))?;
        let addresses = raw
            .addresses
            .into_iter()
            .map(AddressEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            connection: raw.connection.try_into()?,
            inventory,
            addresses: AddressTable::new(addresses),
            policy: raw.policy.try_into()?,
        })
    }
}

impl TryFrom<ConnectionPointDto> for ConnectionPoint {
    type Error = CollaboratorError;

    fn try_from(raw: ConnectionPointDto) -> Result<Self, Self::Error> {
        Ok(Self {
            vlan: parse_field("VLAN number", &raw.vlan_number)?,
            description: raw.description,
        })
    }
}

impl From<&ConnectionPoint> for ConnectionPointDto {
    fn from(point: &ConnectionPoint) -> Self {
        Self {
            vlan_number: point.vlan.to_string(),
            description: point.description.clone(),
        }
    }
}

// ── Inventory ──────────────────────────────────────────────────────

impl From<PortDto> for Port {
    fn from(raw: PortDto) -> Self {
        Self {
            id: PortId::new(raw.id),
            number: raw.number,
            // A status the console does not know yet still renders.
            status: raw.status.parse().unwrap_or(PortStatus::Unknown),
            speed: raw.speed,
            device: present(raw.device.as_ref()).map(str::to_owned),
        }
    }
}

impl From<SwitchDto> for Switch {
    fn from(raw: SwitchDto) -> Self {
        Self {
            id: SwitchId::new(raw.id),
            name: raw.name,
            location: raw.location,
            model: raw.model,
            ports: raw.ports.into_iter().map(Port::from).collect(),
        }
    }
}

pub(crate) fn reconfigure_request(
    ports: &[PortId],
    params: ReconfigureParams,
) -> ReconfigurePortsRequest {
    ReconfigurePortsRequest {
        port_ids: ports.iter().map(|p| p.get()).collect(),
        speed: params.speed.map(|s| s.as_ref().to_owned()),
        enabled: params.enabled,
        vlan: params.vlan,
    }
}

// ── Address table ──────────────────────────────────────────────────

impl TryFrom<AddressDto> for AddressEntry {
    type Error = CollaboratorError;

    fn try_from(raw: AddressDto) -> Result<Self, Self::Error> {
        Ok(Self {
            address: parse_field("address", &raw.ip)?,
            public: raw.is_real_ip,
            mac: parse_mac(raw.mac.as_ref()),
            hostname: raw.hostname,
            vendor: present(raw.vendor.as_ref()).map(str::to_owned),
            status: parse_field::<AddressStatus>("address status", &raw.status)?,
            lease_age: raw.dhcp,
            throughput: raw.internet,
            netmask: parse_ip("netmask", raw.mask.as_ref())?,
            gateway: parse_ip("gateway", raw.gateway.as_ref())?,
            dns: parse_dns(&raw.dns)?,
            description: raw.description,
            mac_binding: parse_mac(raw.mac_bind.as_ref()),
            arp: parse_mac(raw.arp.as_ref()),
        })
    }
}

impl From<&AddressEntry> for AddressDto {
    fn from(entry: &AddressEntry) -> Self {
        Self {
            ip: entry.address.to_string(),
            is_real_ip: entry.public,
            mac: entry.mac.as_ref().map(ToString::to_string),
            hostname: entry.hostname.clone(),
            vendor: entry.vendor.clone(),
            status: entry.status.to_string(),
            dhcp: entry.lease_age.clone(),
            internet: entry.throughput.clone(),
            mask: entry.netmask.map(|ip| ip.to_string()),
            gateway: entry.gateway.map(|ip| ip.to_string()),
            dns: entry.dns.iter().map(ToString::to_string).collect(),
            description: entry.description.clone(),
            mac_bind: entry.mac_binding.as_ref().map(ToString::to_string),
            arp: entry.arp.as_ref().map(ToString::to_string),
        }
    }
}

// ── Policy ─────────────────────────────────────────────────────────

impl TryFrom<AutoBlockDto> for AutoBlockEvidence {
    type Error = CollaboratorError;

    fn try_from(raw: AutoBlockDto) -> Result<Self, Self::Error> {
        if !raw.rule.eq_ignore_ascii_case("smtp") {
            return Err(CollaboratorError::malformed(format!(
                "unexpected auto-block rule: {:?}",
                raw.rule
            )));
        }
        Ok(Self {
            observed_at: raw.observed_at,
            source: parse_field("auto-block source", &raw.source_ip)?,
            packets: raw.packets,
            window_secs: raw.window_secs,
        })
    }
}

impl From<&AutoBlockEvidence> for AutoBlockDto {
    fn from(evidence: &AutoBlockEvidence) -> Self {
        Self {
            rule: "smtp".into(),
            observed_at: evidence.observed_at,
            source_ip: evidence.source.to_string(),
            packets: evidence.packets,
            window_secs: evidence.window_secs,
        }
    }
}

impl TryFrom<PolicyDto> for ConnectionPolicy {
    type Error = CollaboratorError;

    fn try_from(raw: PolicyDto) -> Result<Self, Self::Error> {
        let auto_block = match raw.auto_block {
            Some(dto) => AutoBlock::Smtp(dto.try_into()?),
            None => AutoBlock::None,
        };
        Ok(Self {
            dhcp_mode: parse_field("DHCP mode", &raw.dhcp_mode)?,
            distribution: parse_field("distribution mode", &raw.ip_distribution_mode)?,
            internet: parse_field("internet access", &raw.internet_access)?,
            caps: BandwidthCaps {
                incoming: parse_tier("incoming speed", raw.incoming_speed)?,
                outgoing: parse_tier("outgoing speed", raw.outgoing_speed)?,
            },
            auto_block,
        })
    }
}

impl From<&ConnectionPolicy> for PolicyDto {
    fn from(policy: &ConnectionPolicy) -> Self {
        Self {
            dhcp_mode: policy.dhcp_mode.to_string(),
            ip_distribution_mode: policy.distribution.to_string(),
            internet_access: policy.internet.to_string(),
            incoming_speed: policy.caps.incoming.mbps(),
            outgoing_speed: policy.caps.outgoing.mbps(),
            auto_block: policy.auto_block.evidence().map(AutoBlockDto::from),
        }
    }
}

// ── Telemetry ──────────────────────────────────────────────────────

pub(crate) fn telemetry_query(tab: Tab, chart: ChartConfig) -> TelemetryQuery {
    TelemetryQuery {
        tab: tab.to_string(),
        chart: chart.kind.to_string(),
        interval: chart.interval.to_string(),
        realtime: chart.realtime,
    }
}

impl TryFrom<TabDataResponse> for TabPayload {
    type Error = CollaboratorError;

    fn try_from(raw: TabDataResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            tab: parse_field("tab", &raw.tab)?,
            body: raw.data,
        })
    }
}

impl From<CablePairDto> for PairReport {
    fn from(raw: CablePairDto) -> Self {
        Self {
            pair: raw.pair,
            status: raw.status.parse().unwrap_or(PairStatus::Unknown),
            length_m: raw.length_m,
        }
    }
}

impl From<CableTestResponse> for CableReport {
    fn from(raw: CableTestResponse) -> Self {
        Self {
            category: raw.category,
            pairs: raw.pairs.into_iter().map(PairReport::from).collect(),
        }
    }
}

impl TryFrom<LeaseDto> for LeaseRecord {
    type Error = CollaboratorError;

    fn try_from(raw: LeaseDto) -> Result<Self, Self::Error> {
        Ok(Self {
            address: parse_field("lease address", &raw.ip)?,
            uptime: raw.uptime,
            hostname: present(raw.hostname.as_ref()).map(str::to_owned),
        })
    }
}

impl TryFrom<DiscoveredDeviceDto> for DiscoveredDevice {
    type Error = CollaboratorError;

    fn try_from(raw: DiscoveredDeviceDto) -> Result<Self, Self::Error> {
        Ok(Self {
            vlan: raw.vlan,
            mac: MacAddress::new(&raw.mac),
            vendor: present(raw.vendor.as_ref()).map(str::to_owned),
            leases: raw
                .leases
                .into_iter()
                .map(LeaseRecord::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
