// ── IP-level address table ──

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::entity_id::MacAddress;

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AddressStatus {
    Active,
    Blocked,
    Inactive,
}

/// One row of the address table.
///
/// `mac` and `arp` are what the network currently shows; `mac_binding` is
/// the operator's pin and holds regardless of which MAC appears in traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub address: IpAddr,
    /// Publicly routable address.
    pub public: bool,
    pub mac: Option<MacAddress>,
    pub hostname: String,
    pub vendor: Option<String>,
    pub status: AddressStatus,
    /// Lease age as the backend reports it; "—" for static assignments.
    pub lease_age: String,
    pub throughput: String,
    pub netmask: Option<IpAddr>,
    pub gateway: Option<IpAddr>,
    /// Primary server first.
    pub dns: Vec<IpAddr>,
    pub description: String,
    pub mac_binding: Option<MacAddress>,
    pub arp: Option<MacAddress>,
}

impl AddressEntry {
    /// A binding exists and the observed MAC is a different one.
    pub fn binding_mismatch(&self) -> bool {
        match (&self.mac_binding, &self.mac) {
            (Some(bound), Some(seen)) => bound != seen,
            _ => false,
        }
    }

    pub fn primary_dns(&self) -> Option<IpAddr> {
        self.dns.first().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressTable {
    entries: Vec<AddressEntry>,
}

impl AddressTable {
    pub fn new(entries: Vec<AddressEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, address: IpAddr) -> Option<&AddressEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.find(address).is_some()
    }

    pub(crate) fn find_mut(&mut self, address: IpAddr) -> Option<&mut AddressEntry> {
        self.entries.iter_mut().find(|e| e.address == address)
    }

    pub fn mismatched_bindings(&self) -> impl Iterator<Item = &AddressEntry> {
        self.entries.iter().filter(|e| e.binding_mismatch())
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::entry;
    use super::*;

    #[test]
    fn mismatch_needs_both_sides() {
        let mut row = entry("10.190.1.160", Some("d8:bb:c1:5f:5c:2c"));
        assert!(!row.binding_mismatch());

        row.mac_binding = Some(MacAddress::new("D8-BB-C1-5F-5C-2C"));
        assert!(!row.binding_mismatch());

        row.mac_binding = Some(MacAddress::new("b8:cc:f1:5f:bb:4a"));
        assert!(row.binding_mismatch());

        row.mac = None;
        assert!(!row.binding_mismatch());
    }

    #[test]
    fn lookup_by_address() {
        let table = AddressTable::new(vec![
            entry("10.190.1.160", None),
            entry("188.191.128.20", None),
        ]);
        let ip: IpAddr = "188.191.128.20".parse().unwrap();
        assert!(table.contains(ip));
        assert!(table.find("10.0.0.1".parse().unwrap()).is_none());
    }
}
