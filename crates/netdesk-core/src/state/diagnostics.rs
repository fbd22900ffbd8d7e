// ── Diagnostics session commands ──

use tracing::debug;

use super::{ConsoleState, Notice};
use crate::command::Effect;
use crate::error::{CollaboratorError, CoreError};
use crate::model::{CableReport, DiscoveredDevice, Inventory, PortId, SwitchId, Tab, TabPayload};
use crate::session::{DiagnosticsSession, RequestToken, SessionId, SessionTokens, Settlement};

impl ConsoleState {
    pub(super) fn session_mut(&mut self) -> Result<&mut DiagnosticsSession, CoreError> {
        self.session_parts().map(|(session, _, _)| session)
    }

    /// The open session next to the inventory and token counters it works on.
    fn session_parts(
        &mut self,
    ) -> Result<(&mut DiagnosticsSession, &Inventory, &mut SessionTokens), CoreError> {
        let session = self
            .diagnostics
            .as_mut()
            .ok_or_else(|| CoreError::validation("diagnostics is not open"))?;
        Ok((session, &self.inventory, &mut self.tokens.session))
    }

    /// Open (or reopen) the session. Whatever the previous session had in
    /// flight is orphaned by the new session id.
    pub(super) fn open_diagnostics(
        &mut self,
        switch: Option<SwitchId>,
        port: Option<PortId>,
    ) -> Result<Vec<Effect>, CoreError> {
        let (session, effects) = DiagnosticsSession::open(
            &self.inventory,
            &mut self.tokens.session,
            switch,
            port,
            self.chart_defaults,
        )?;
        debug!(session = %session.id(), ?switch, ?port, "diagnostics opened");
        self.diagnostics = Some(session);
        Ok(effects)
    }

    pub(super) fn close_diagnostics(&mut self) {
        if let Some(session) = self.diagnostics.take() {
            debug!(session = %session.id(), "diagnostics closed");
        }
    }

    pub(super) fn select_session_switch(&mut self, switch: SwitchId) -> Result<Vec<Effect>, CoreError> {
        let (session, inventory, _) = self.session_parts()?;
        session.select_switch(inventory, switch)?;
        Ok(Vec::new())
    }

    pub(super) fn select_session_port(&mut self, port: PortId) -> Result<Vec<Effect>, CoreError> {
        let (session, inventory, tokens) = self.session_parts()?;
        session.select_port(inventory, tokens, port)
    }

    pub(super) fn change_tab(&mut self, tab: Tab) -> Result<Vec<Effect>, CoreError> {
        let (session, _, tokens) = self.session_parts()?;
        Ok(session.change_tab(tokens, tab))
    }

    pub(super) fn run_cable_test(&mut self) -> Result<Effect, CoreError> {
        let (session, _, tokens) = self.session_parts()?;
        session.run_cable_test(tokens)
    }

    pub(super) fn discover_devices(&mut self) -> Result<Effect, CoreError> {
        let (session, _, tokens) = self.session_parts()?;
        session.discover_devices(tokens)
    }

    /// Close the session when the inventory no longer backs its switch or port.
    pub(super) fn revalidate_session(&mut self) {
        let Some(session) = self.diagnostics.as_ref() else {
            return;
        };
        if let Err(err) = session.validate_against(&self.inventory) {
            debug!(session = %session.id(), error = %err, "closing orphaned session");
            self.diagnostics = None;
            self.notices
                .push(Notice::warning(format!("diagnostics closed: {err}")));
        }
    }

    // ── Settlements ─────────────────────────────────────────────────

    /// The open session if `id` names it. Settlements for a closed or
    /// replaced session land nowhere.
    fn session_for(&mut self, id: SessionId, token: RequestToken) -> Option<&mut DiagnosticsSession> {
        match self.diagnostics.as_mut() {
            Some(session) if session.id() == id => Some(session),
            _ => {
                debug!(session = %id, %token, "discarding settlement for closed session");
                None
            }
        }
    }

    fn report(&mut self, what: &str, token: RequestToken, settlement: Settlement) {
        match settlement {
            Settlement::Applied => {}
            Settlement::Failed(err) => self.fail(what, &err),
            Settlement::Stale => debug!(%token, what, "discarding stale settlement"),
        }
    }

    pub(super) fn tab_data_loaded(
        &mut self,
        session: SessionId,
        token: RequestToken,
        outcome: Result<TabPayload, CollaboratorError>,
    ) {
        if let Some(open) = self.session_for(session, token) {
            let settlement = open.settle_tab_data(token, outcome);
            self.report("load tab data", token, settlement);
        }
    }

    pub(super) fn cable_test_finished(
        &mut self,
        session: SessionId,
        token: RequestToken,
        outcome: Result<CableReport, CollaboratorError>,
    ) {
        if let Some(open) = self.session_for(session, token) {
            let settlement = open.settle_cable_test(token, outcome);
            self.report("cable test", token, settlement);
        }
    }

    pub(super) fn devices_discovered(
        &mut self,
        session: SessionId,
        token: RequestToken,
        outcome: Result<Vec<DiscoveredDevice>, CollaboratorError>,
    ) {
        if let Some(open) = self.session_for(session, token) {
            let settlement = open.settle_discovery(token, outcome);
            self.report("device discovery", token, settlement);
        }
    }
}
