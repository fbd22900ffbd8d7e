// ── Selection engine ──
//
// One global set of selected port ids, always queried per switch against
// the inventory. Membership never references a port the inventory no
// longer holds: removals go through `remove` / `retain_existing`.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{Inventory, PortId, SwitchId};

/// Tri-state of a switch's "select all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SelectAllState {
    None,
    Partial,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ports: BTreeSet<PortId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, port: PortId) -> bool {
        self.ports.contains(&port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().copied()
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Flip membership of one port.
    pub fn toggle(&mut self, port: PortId) {
        if !self.ports.remove(&port) {
            self.ports.insert(port);
        }
    }

    /// Clear the switch when every one of its ports is selected, otherwise
    /// select all of them. A partial selection always becomes full.
    pub fn toggle_all(&mut self, inventory: &Inventory, switch: SwitchId) {
        if self.is_all_selected(inventory, switch) {
            self.clear_for_switch(inventory, switch);
        } else {
            self.ports
                .extend(inventory.ports_of(switch).iter().map(|p| p.id));
        }
    }

    /// Remove exactly this switch's ports from the set. Returns how many
    /// were removed.
    pub fn clear_for_switch(&mut self, inventory: &Inventory, switch: SwitchId) -> usize {
        let before = self.ports.len();
        for port in inventory.ports_of(switch) {
            self.ports.remove(&port.id);
        }
        before - self.ports.len()
    }

    pub fn remove(&mut self, ports: &[PortId]) {
        for port in ports {
            self.ports.remove(port);
        }
    }

    /// Put ports back, skipping any the inventory no longer holds.
    pub fn restore(&mut self, inventory: &Inventory, ports: &[PortId]) {
        self.ports
            .extend(ports.iter().copied().filter(|p| inventory.contains_port(*p)));
    }

    /// Drop every id the inventory no longer contains.
    pub fn retain_existing(&mut self, inventory: &Inventory) {
        self.ports.retain(|p| inventory.contains_port(*p));
    }

    // ── Per-switch queries ──────────────────────────────────────────

    pub fn count_selected(&self, inventory: &Inventory, switch: SwitchId) -> usize {
        inventory
            .ports_of(switch)
            .iter()
            .filter(|p| self.ports.contains(&p.id))
            .count()
    }

    /// True only for a switch with at least one port, all of them selected.
    pub fn is_all_selected(&self, inventory: &Inventory, switch: SwitchId) -> bool {
        let ports = inventory.ports_of(switch);
        !ports.is_empty() && ports.iter().all(|p| self.ports.contains(&p.id))
    }

    pub fn is_partially_selected(&self, inventory: &Inventory, switch: SwitchId) -> bool {
        self.state(inventory, switch) == SelectAllState::Partial
    }

    pub fn state(&self, inventory: &Inventory, switch: SwitchId) -> SelectAllState {
        let total = inventory.ports_of(switch).len();
        match self.count_selected(inventory, switch) {
            0 => SelectAllState::None,
            n if n == total => SelectAllState::All,
            _ => SelectAllState::Partial,
        }
    }

    /// Selected ports of one switch, in physical order.
    pub fn selected_on(&self, inventory: &Inventory, switch: SwitchId) -> Vec<PortId> {
        inventory
            .ports_of(switch)
            .iter()
            .map(|p| p.id)
            .filter(|id| self.ports.contains(id))
            .collect()
    }
}
