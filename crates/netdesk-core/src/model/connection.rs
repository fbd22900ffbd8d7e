// ── Connection point ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// VLAN identifier of a connection point, `NN-NNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VlanNumber(String);

impl VlanNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VlanNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = s
            .split_once('-')
            .is_some_and(|(head, tail)| {
                head.len() == 2
                    && tail.len() == 4
                    && head.chars().chain(tail.chars()).all(|c| c.is_ascii_digit())
            });
        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(CoreError::validation(format!(
                "VLAN number must look like NN-NNNN, got {s:?}"
            )))
        }
    }
}

impl TryFrom<String> for VlanNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VlanNumber> for String {
    fn from(vlan: VlanNumber) -> Self {
        vlan.0
    }
}

impl fmt::Display for VlanNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The logical uplink whose policy the console manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub vlan: VlanNumber,
    pub description: String,
}

impl ConnectionPoint {
    /// Replace the description. Surrounding whitespace is dropped and an
    /// empty result is rejected.
    pub fn set_description(&mut self, description: &str) -> Result<(), CoreError> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation(
                "connection description must not be empty",
            ));
        }
        trimmed.clone_into(&mut self.description);
        Ok(())
    }
}

/// Header figures for the connection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub vlan: Option<VlanNumber>,
    pub description: Option<String>,
    pub switch_count: usize,
    pub active_ports: usize,
}
