//! Wire types for the netdesk backend.
//!
//! All types match the JSON bodies of the `v1/` endpoints. Field names use
//! camelCase via `#[serde(rename_all = "camelCase")]`; enumerations travel
//! as lowercase strings and are validated by `netdesk-core` on conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Site snapshot ────────────────────────────────────────────────────

/// Everything the console projects -- from `GET v1/site`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSnapshotResponse {
    pub connection: ConnectionPointDto,
    #[serde(default)]
    pub switches: Vec<SwitchDto>,
    #[serde(default)]
    pub addresses: Vec<AddressDto>,
    pub policy: PolicyDto,
}

/// The logical uplink whose policy is managed. Also the `PUT v1/connection` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPointDto {
    /// VLAN identifier in `NN-NNNN` form.
    pub vlan_number: String,
    #[serde(default)]
    pub description: String,
}

// ── Switches / ports ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDto {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub model: String,
    /// Physical order.
    #[serde(default)]
    pub ports: Vec<PortDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDto {
    pub id: u32,
    pub number: u16,
    /// One of: `active`, `inactive`, `blocked`, `unknown`.
    pub status: String,
    /// Negotiated speed label, e.g. `"1 Gbps"`.
    pub speed: String,
    pub device: Option<String>,
}

/// Response body of the add-switch / add-port endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: u32,
}

/// `POST v1/ports/delete` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePortsRequest {
    pub port_ids: Vec<u32>,
}

/// `POST v1/ports/reconfigure` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconfigurePortsRequest {
    pub port_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

/// `PUT v1/ports/{port}/status` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatusRequest {
    /// `up` or `down`.
    pub state: String,
}

/// `PUT v1/ports/{port}/speed` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpeedRequest {
    /// `auto` or a megabit tier (`10`, `100`, `1000`, `10000`).
    pub speed: String,
}

// ── IP table ─────────────────────────────────────────────────────────

/// One row of the IP-level table. Also the `PUT v1/addresses/{ip}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub ip: String,
    #[serde(default)]
    pub is_real_ip: bool,
    /// Observed MAC; the backend sends `"—"` when none has been seen.
    pub mac: Option<String>,
    #[serde(default)]
    pub hostname: String,
    pub vendor: Option<String>,
    /// One of: `active`, `blocked`, `inactive`.
    pub status: String,
    /// Lease age as free text (`"16 min"`, `"—"` for static).
    #[serde(default)]
    pub dhcp: String,
    /// Current throughput label.
    #[serde(default)]
    pub internet: String,
    pub mask: Option<String>,
    pub gateway: Option<String>,
    #[serde(default)]
    pub dns: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub mac_bind: Option<String>,
    pub arp: Option<String>,
}

// ── Policy ───────────────────────────────────────────────────────────

/// Connection policy. Also the `PUT v1/policy` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDto {
    /// One of: `auto`, `auto-manual`, `manual`.
    pub dhcp_mode: String,
    /// One of: `simple`, `advanced`.
    pub ip_distribution_mode: String,
    /// One of: `closed`, `open`.
    pub internet_access: String,
    /// Megabits per second, from the tier set 10/50/100/500/1000.
    pub incoming_speed: u32,
    pub outgoing_speed: u32,
    /// Present only while an auto-block is engaged.
    pub auto_block: Option<AutoBlockDto>,
}

/// Evidence attached by the enforcement side when auto-block engages.
/// Also the body of `GET v1/policy/auto-block` (or `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBlockDto {
    /// Rule that fired, currently always `smtp`.
    pub rule: String,
    pub observed_at: DateTime<Utc>,
    pub source_ip: String,
    pub packets: u32,
    pub window_secs: u32,
}

// ── Telemetry ────────────────────────────────────────────────────────

/// Query string of `GET v1/switches/{s}/ports/{p}/telemetry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryQuery {
    pub tab: String,
    pub chart: String,
    pub interval: String,
    pub realtime: bool,
}

/// Tab content; opaque beyond the tab it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDataResponse {
    pub tab: String,
    #[serde(default)]
    pub data: Value,
}

/// Result of `POST v1/switches/{s}/ports/{p}/cable-test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CableTestResponse {
    /// Cable category label, e.g. `"Cat5e"`.
    pub category: String,
    #[serde(default)]
    pub pairs: Vec<CablePairDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CablePairDto {
    pub pair: u8,
    /// One of: `ok`, `open`, `short`, `impedance-mismatch`, `crosstalk`, `unknown`.
    pub status: String,
    pub length_m: Option<f32>,
}

/// One endpoint from `GET v1/switches/{s}/ports/{p}/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDeviceDto {
    pub vlan: u16,
    pub mac: String,
    pub vendor: Option<String>,
    #[serde(default)]
    pub leases: Vec<LeaseDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseDto {
    pub ip: String,
    #[serde(default)]
    pub uptime: String,
    pub hostname: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_tolerates_missing_collections() {
        let raw = json!({
            "connection": { "vlanNumber": "01-0179" },
            "policy": {
                "dhcpMode": "auto",
                "ipDistributionMode": "simple",
                "internetAccess": "closed",
                "incomingSpeed": 100,
                "outgoingSpeed": 100,
                "autoBlock": null
            }
        });
        let snap: SiteSnapshotResponse = serde_json::from_value(raw).unwrap();
        assert!(snap.switches.is_empty());
        assert!(snap.addresses.is_empty());
        assert_eq!(snap.connection.description, "");
    }

    #[test]
    fn reconfigure_request_skips_unset_fields() {
        let req = ReconfigurePortsRequest {
            port_ids: vec![3, 4],
            speed: Some("1000".into()),
            enabled: None,
            vlan: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({ "portIds": [3, 4], "speed": "1000" }));
    }

    #[test]
    fn address_row_uses_camel_case() {
        let raw = json!({
            "ip": "10.190.1.160",
            "isRealIp": false,
            "mac": "d8:bb:c1:5f:5c:2c",
            "hostname": "iMacPro-mixa",
            "vendor": "Apple Inc.",
            "status": "active",
            "dhcp": "16 min",
            "internet": "9.89 kbit/s",
            "mask": "255.255.255.0",
            "gateway": "10.190.1.1",
            "dns": ["192.168.50.100", "192.168.50.50"],
            "description": "wi-fi office",
            "macBind": "d8:bb:c1:5f:5c:2c",
            "arp": "b8:cc:f1:5f:bb:4a"
        });
        let row: AddressDto = serde_json::from_value(raw).unwrap();
        assert_eq!(row.mac_bind.as_deref(), Some("d8:bb:c1:5f:5c:2c"));
        assert_eq!(row.dns.len(), 2);
    }
}
