// ── Provisioning, policy and address-table commands ──

use std::net::IpAddr;

use tracing::{debug, info, warn};

use super::{ConsoleState, Notice, PendingOperation};
use crate::command::{Effect, OperationAck, ReconfigureParams};
use crate::error::{CollaboratorError, CoreError};
use crate::model::{AutoBlockEvidence, LinkState, MacAddress, PortId, SiteSnapshot, SpeedSetting, SwitchId};
use crate::session::{RequestToken, Settlement};

impl ConsoleState {
    // ── Snapshot ────────────────────────────────────────────────────

    /// Start a snapshot fetch. A newer fetch supersedes an older one.
    pub(super) fn start_refresh(&mut self) -> Effect {
        let token = self.tokens.snapshot.issue();
        self.snapshot.begin(token);
        debug!(%token, "snapshot fetch issued");
        Effect::FetchSnapshot { token }
    }

    pub(super) fn snapshot_loaded(
        &mut self,
        token: RequestToken,
        outcome: Result<SiteSnapshot, CollaboratorError>,
    ) -> Vec<Effect> {
        let (marker, snapshot) = match outcome {
            Ok(snapshot) => (Ok(()), Some(snapshot)),
            Err(err) => (Err(err), None),
        };
        match self.snapshot.settle(token, marker) {
            Settlement::Applied => {
                if let Some(snapshot) = snapshot {
                    self.install_snapshot(snapshot);
                }
            }
            Settlement::Failed(err) => self.fail("refresh", &err),
            Settlement::Stale => debug!(%token, "discarding stale snapshot"),
        }
        Vec::new()
    }

    /// Replace the projection and drop every reference the new inventory
    /// no longer backs.
    fn install_snapshot(&mut self, snapshot: SiteSnapshot) {
        self.inventory = snapshot.inventory;
        self.addresses = snapshot.addresses;
        self.policy = snapshot.policy;
        self.connection = Some(snapshot.connection);

        // Operator edits still in flight are not in this snapshot yet.
        self.overtaken_syncs.extend(
            self.pending
                .iter()
                .filter(|(_, op)| op.is_sync())
                .map(|(token, _)| *token),
        );

        self.selection.retain_existing(&self.inventory);
        let inventory = &self.inventory;
        self.port_controls.retain(|p, _| inventory.contains_port(*p));
        self.disclosure.reconcile(&self.inventory, &self.addresses);
        self.revalidate_session();

        info!(
            switches = self.inventory.switch_count(),
            active_ports = self.inventory.active_port_count(),
            addresses = self.addresses.len(),
            "snapshot applied"
        );
    }

    // ── Tracked operations ──────────────────────────────────────────

    fn track(&mut self, operation: PendingOperation) -> RequestToken {
        let token = self.tokens.operation.issue();
        debug!(%token, %operation, "operation issued");
        self.pending.insert(token, operation);
        token
    }

    pub(super) fn add_switch(&mut self) -> Effect {
        let token = self.track(PendingOperation::AddSwitch);
        Effect::AddSwitch { token }
    }

    pub(super) fn add_port(&mut self, switch: SwitchId) -> Result<Effect, CoreError> {
        self.require_switch(switch)?;
        let token = self.track(PendingOperation::AddPort { switch });
        Ok(Effect::AddPort { token, switch })
    }

    /// Delete the selected ports of one switch. They leave the selection
    /// now and the inventory once the backend confirms; a rejected delete
    /// puts them back in the selection.
    pub(super) fn delete_selected_ports(&mut self, switch: SwitchId) -> Result<Effect, CoreError> {
        self.require_switch(switch)?;
        let ports = self.selection.selected_on(&self.inventory, switch);
        if ports.is_empty() {
            return Err(CoreError::validation(format!(
                "no ports selected on switch {switch}"
            )));
        }
        self.selection.remove(&ports);
        let token = self.track(PendingOperation::DeletePorts {
            switch,
            ports: ports.clone(),
        });
        Ok(Effect::DeletePorts { token, ports })
    }

    pub(super) fn reconfigure_selected_ports(
        &mut self,
        switch: SwitchId,
        params: ReconfigureParams,
    ) -> Result<Effect, CoreError> {
        self.require_switch(switch)?;
        if params.is_empty() {
            return Err(CoreError::validation("nothing to reconfigure"));
        }
        let ports = self.selection.selected_on(&self.inventory, switch);
        if ports.is_empty() {
            return Err(CoreError::validation(format!(
                "no ports selected on switch {switch}"
            )));
        }
        let token = self.track(PendingOperation::ReconfigurePorts {
            switch,
            ports: ports.clone(),
        });
        Ok(Effect::ReconfigurePorts {
            token,
            ports,
            params,
        })
    }

    pub(super) fn operation_settled(
        &mut self,
        token: RequestToken,
        outcome: Result<OperationAck, CollaboratorError>,
    ) -> Vec<Effect> {
        let Some(operation) = self.pending.remove(&token) else {
            debug!(%token, "discarding settlement for unknown operation");
            return Vec::new();
        };
        let overtaken = self.overtaken_syncs.remove(&token);

        match outcome {
            Ok(ack) => {
                info!(%token, %operation, ?ack, "operation acknowledged");
                match operation {
                    PendingOperation::DeletePorts { ports, .. } => {
                        self.remove_ports(&ports);
                        Vec::new()
                    }
                    PendingOperation::AddSwitch
                    | PendingOperation::AddPort { .. }
                    | PendingOperation::ReconfigurePorts { .. } => vec![self.start_refresh()],
                    PendingOperation::ApplyPolicy
                    | PendingOperation::UpdateAddress { .. }
                    | PendingOperation::UpdateConnection if overtaken => {
                        debug!(%token, %operation, "snapshot predates this edit, refetching");
                        vec![self.start_refresh()]
                    }
                    PendingOperation::ApplyPolicy
                    | PendingOperation::UpdateAddress { .. }
                    | PendingOperation::UpdateConnection => Vec::new(),
                }
            }
            Err(err) => {
                self.fail(&operation.to_string(), &err);
                if let PendingOperation::DeletePorts { ports, .. } = &operation {
                    self.selection.restore(&self.inventory, ports);
                }
                if operation.is_sync() {
                    vec![self.start_refresh()]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Drop ports from the inventory and from everything referencing them.
    fn remove_ports(&mut self, ports: &[PortId]) {
        let removed = self.inventory.remove_ports(ports);
        self.selection.remove(&removed);
        for port in &removed {
            self.port_controls.remove(port);
        }
        self.revalidate_session();
    }

    // ── Port link / speed ───────────────────────────────────────────

    pub(super) fn set_port_status(
        &mut self,
        port: PortId,
        state: LinkState,
    ) -> Result<Effect, CoreError> {
        self.require_port(port)?;
        let token = self.tokens.port_status.issue();
        self.port_controls.entry(port).or_default().status.begin(token);
        Ok(Effect::SetPortStatus { token, port, state })
    }

    pub(super) fn set_port_speed(
        &mut self,
        port: PortId,
        speed: SpeedSetting,
    ) -> Result<Effect, CoreError> {
        self.require_port(port)?;
        let token = self.tokens.port_speed.issue();
        self.port_controls.entry(port).or_default().speed.begin(token);
        Ok(Effect::SetPortSpeed { token, port, speed })
    }

    pub(super) fn port_status_applied(
        &mut self,
        port: PortId,
        token: RequestToken,
        outcome: Result<LinkState, CollaboratorError>,
    ) {
        let Some(control) = self.port_controls.get_mut(&port) else {
            debug!(%port, %token, "discarding status ack for untracked port");
            return;
        };
        match control.status.settle(token, outcome) {
            Settlement::Applied => {
                let state = control.status.value().copied();
                if let (Some(state), Some(entry)) = (state, self.inventory.port_mut(port)) {
                    entry.status = state.resulting_status();
                }
            }
            Settlement::Failed(err) => self.fail(&format!("set link on port {port}"), &err),
            Settlement::Stale => debug!(%port, %token, "discarding stale status ack"),
        }
    }

    pub(super) fn port_speed_applied(
        &mut self,
        port: PortId,
        token: RequestToken,
        outcome: Result<SpeedSetting, CollaboratorError>,
    ) {
        let Some(control) = self.port_controls.get_mut(&port) else {
            debug!(%port, %token, "discarding speed ack for untracked port");
            return;
        };
        match control.speed.settle(token, outcome) {
            Settlement::Applied => {
                let speed = control.speed.value().copied();
                if let (Some(speed), Some(entry)) = (speed, self.inventory.port_mut(port)) {
                    speed.label().clone_into(&mut entry.speed);
                }
            }
            Settlement::Failed(err) => self.fail(&format!("set speed on port {port}"), &err),
            Settlement::Stale => debug!(%port, %token, "discarding stale speed ack"),
        }
    }

    // ── Policy ──────────────────────────────────────────────────────

    pub(super) fn sync_policy(&mut self) -> Effect {
        let token = self.track(PendingOperation::ApplyPolicy);
        Effect::ApplyPolicy {
            token,
            policy: self.policy.clone(),
        }
    }

    pub(super) fn cancel_auto_block(&mut self) -> Result<Effect, CoreError> {
        let dismissed = self.policy.auto_block.evidence().map(|e| e.observed_at);
        self.policy.cancel_auto_block()?;
        self.auto_block_dismissed = self.auto_block_dismissed.max(dismissed);
        Ok(self.sync_policy())
    }

    pub(super) fn auto_block_observed(&mut self, evidence: AutoBlockEvidence) {
        if self.policy.auto_block.evidence() == Some(&evidence) {
            return;
        }
        if self
            .auto_block_dismissed
            .is_some_and(|cut| evidence.observed_at <= cut)
        {
            debug!(observed_at = %evidence.observed_at, "ignoring cancelled auto-block evidence");
            return;
        }
        warn!(source = %evidence.source, packets = evidence.packets, "auto-block engaged");
        self.notices
            .push(Notice::warning(format!("SMTP auto-block engaged: {evidence}")));
        self.policy.engage_auto_block(evidence);
    }

    // ── Address table / connection point ────────────────────────────

    fn update_entry(
        &mut self,
        address: IpAddr,
        edit: impl FnOnce(&mut crate::model::AddressEntry) -> Result<(), CoreError>,
    ) -> Result<Effect, CoreError> {
        let entry = self
            .addresses
            .find_mut(address)
            .ok_or_else(|| CoreError::not_found("address", address))?;
        edit(entry)?;
        let entry = entry.clone();
        let token = self.track(PendingOperation::UpdateAddress { address });
        Ok(Effect::UpdateAddress {
            token,
            address,
            entry,
        })
    }

    pub(super) fn bind_mac(&mut self, address: IpAddr, mac: MacAddress) -> Result<Effect, CoreError> {
        if !mac.is_well_formed() {
            return Err(CoreError::validation(format!("malformed MAC address: {mac}")));
        }
        self.update_entry(address, |entry| {
            entry.mac_binding = Some(mac);
            Ok(())
        })
    }

    pub(super) fn unbind_mac(&mut self, address: IpAddr) -> Result<Effect, CoreError> {
        self.update_entry(address, |entry| {
            if entry.mac_binding.take().is_none() {
                return Err(CoreError::validation(format!(
                    "address {address} has no MAC binding"
                )));
            }
            Ok(())
        })
    }

    pub(super) fn set_address_description(
        &mut self,
        address: IpAddr,
        description: &str,
    ) -> Result<Effect, CoreError> {
        self.update_entry(address, |entry| {
            description.trim().clone_into(&mut entry.description);
            Ok(())
        })
    }

    pub(super) fn update_connection_description(
        &mut self,
        description: &str,
    ) -> Result<Effect, CoreError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| CoreError::not_found("connection point", "current"))?;
        connection.set_description(description)?;
        let connection = connection.clone();
        let token = self.track(PendingOperation::UpdateConnection);
        Ok(Effect::UpdateConnection { token, connection })
    }
}
