// ── Diagnostics session ──
//
// A short-lived state machine scoped to one (switch, port) pair. It owns
// the active tab, the chart configuration and three independent async
// slots. Tokens come from counters the console owns, so they keep rising
// across sessions; each settlement also names the session it belongs to.

pub mod slot;

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::command::Effect;
use crate::error::{CollaboratorError, CoreError};
use crate::model::{
    CableReport, ChartConfig, ChartKind, DiscoveredDevice, IntervalStep, Inventory, Port, PortId,
    SwitchId, Tab, TabPayload, TimeInterval,
};

pub use slot::{AsyncSlot, RequestToken, Settlement};
use slot::TokenCounter;

/// Identity of one opened session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Where an open session stands on the switch → port cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Unscoped,
    SwitchSelected(SwitchId),
    PortSelected { switch: SwitchId, port: PortId },
}

/// Console-wide token counters for the session slots.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionTokens {
    session: u64,
    tab: TokenCounter,
    cable: TokenCounter,
    discovery: TokenCounter,
}

impl SessionTokens {
    fn next_session(&mut self) -> SessionId {
        self.session += 1;
        SessionId(self.session)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsSession {
    id: SessionId,
    switch: Option<SwitchId>,
    port: Option<PortId>,
    tab: Tab,
    chart: ChartConfig,
    tab_data: AsyncSlot<TabPayload>,
    cable_test: AsyncSlot<CableReport>,
    discovery: AsyncSlot<Vec<DiscoveredDevice>>,
}

impl DiagnosticsSession {
    /// Open a session. A port requires its owning switch; the tab always
    /// starts on the graph. With a port selected the graph load starts
    /// immediately.
    pub(crate) fn open(
        inventory: &Inventory,
        tokens: &mut SessionTokens,
        switch: Option<SwitchId>,
        port: Option<PortId>,
        chart: ChartConfig,
    ) -> Result<(Self, Vec<Effect>), CoreError> {
        if let Some(switch) = switch {
            require_switch(inventory, switch)?;
        }
        match (switch, port) {
            (None, Some(_)) => {
                return Err(CoreError::validation(
                    "a port can only be chosen once a switch is selected",
                ));
            }
            (Some(switch), Some(port)) => require_port_on(inventory, switch, port)?,
            _ => {}
        }

        let mut session = Self {
            id: tokens.next_session(),
            switch,
            port,
            tab: Tab::Graph,
            chart,
            tab_data: AsyncSlot::default(),
            cable_test: AsyncSlot::default(),
            discovery: AsyncSlot::default(),
        };
        let effects = session.start_tab_load(tokens).into_iter().collect();
        Ok((session, effects))
    }

    // ── Read model ──────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn switch(&self) -> Option<SwitchId> {
        self.switch
    }

    pub fn port(&self) -> Option<PortId> {
        self.port
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn chart(&self) -> ChartConfig {
        self.chart
    }

    pub fn tab_data(&self) -> &AsyncSlot<TabPayload> {
        &self.tab_data
    }

    pub fn cable_test(&self) -> &AsyncSlot<CableReport> {
        &self.cable_test
    }

    pub fn discovery(&self) -> &AsyncSlot<Vec<DiscoveredDevice>> {
        &self.discovery
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.switch, self.port) {
            (Some(switch), Some(port)) => SessionPhase::PortSelected { switch, port },
            (Some(switch), None) => SessionPhase::SwitchSelected(switch),
            _ => SessionPhase::Unscoped,
        }
    }

    /// Ports offered by the port picker: those of the selected switch.
    pub fn available_ports<'a>(&self, inventory: &'a Inventory) -> &'a [Port] {
        self.switch.map_or(&[], |s| inventory.ports_of(s))
    }

    pub fn is_busy(&self) -> bool {
        self.tab_data.is_loading() || self.cable_test.is_loading() || self.discovery.is_loading()
    }

    /// Check the session still points at things the inventory holds.
    pub(crate) fn validate_against(&self, inventory: &Inventory) -> Result<(), CoreError> {
        if let Some(switch) = self.switch {
            require_switch(inventory, switch)?;
            if let Some(port) = self.port {
                require_port_on(inventory, switch, port)?;
            }
        }
        Ok(())
    }

    // ── Cascade ─────────────────────────────────────────────────────

    /// Pick a switch. The port selection is always cleared, and every
    /// in-flight operation and stored result is dropped.
    pub(crate) fn select_switch(
        &mut self,
        inventory: &Inventory,
        switch: SwitchId,
    ) -> Result<(), CoreError> {
        require_switch(inventory, switch)?;
        self.switch = Some(switch);
        self.port = None;
        self.reset_results();
        Ok(())
    }

    /// Pick a port of the selected switch and load the current tab for it.
    pub(crate) fn select_port(
        &mut self,
        inventory: &Inventory,
        tokens: &mut SessionTokens,
        port: PortId,
    ) -> Result<Vec<Effect>, CoreError> {
        let Some(switch) = self.switch else {
            return Err(CoreError::validation(
                "select a switch before selecting a port",
            ));
        };
        require_port_on(inventory, switch, port)?;
        self.port = Some(port);
        self.reset_results();
        Ok(self.start_tab_load(tokens).into_iter().collect())
    }

    fn reset_results(&mut self) {
        self.tab_data.reset();
        self.cable_test.reset();
        self.discovery.reset();
    }

    // ── Tabs and chart ──────────────────────────────────────────────

    /// Switch tabs and reload. Without a port nothing can be loaded, but
    /// any earlier load is still superseded.
    pub(crate) fn change_tab(&mut self, tokens: &mut SessionTokens, tab: Tab) -> Vec<Effect> {
        self.tab = tab;
        self.tab_data.supersede();
        self.start_tab_load(tokens).into_iter().collect()
    }

    fn start_tab_load(&mut self, tokens: &mut SessionTokens) -> Option<Effect> {
        let (switch, port) = self.target()?;
        let token = tokens.tab.issue();
        self.tab_data.begin(token);
        debug!(session = %self.id, %token, tab = %self.tab, "tab load issued");
        Some(Effect::LoadTabData {
            session: self.id,
            token,
            switch,
            port,
            tab: self.tab,
            chart: self.chart,
        })
    }

    pub(crate) fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart.kind = kind;
    }

    pub(crate) fn toggle_realtime(&mut self) {
        self.chart.realtime = !self.chart.realtime;
    }

    /// Step the time window; stepping past either end leaves it unchanged.
    pub(crate) fn step_interval(&mut self, step: IntervalStep) {
        self.chart.interval = self.chart.interval.step(step);
    }

    pub(crate) fn set_interval(&mut self, interval: TimeInterval) {
        self.chart.interval = interval;
    }

    // ── Port actions ────────────────────────────────────────────────

    pub(crate) fn run_cable_test(&mut self, tokens: &mut SessionTokens) -> Result<Effect, CoreError> {
        let (switch, port) = self.require_target("cable test")?;
        if self.cable_test.is_loading() {
            return Err(CoreError::validation("a cable test is already running"));
        }
        let token = tokens.cable.issue();
        self.cable_test.begin(token);
        Ok(Effect::RunCableTest {
            session: self.id,
            token,
            switch,
            port,
        })
    }

    pub(crate) fn discover_devices(
        &mut self,
        tokens: &mut SessionTokens,
    ) -> Result<Effect, CoreError> {
        let (switch, port) = self.require_target("device discovery")?;
        if self.discovery.is_loading() {
            return Err(CoreError::validation("device discovery is already running"));
        }
        let token = tokens.discovery.issue();
        self.discovery.begin(token);
        Ok(Effect::DiscoverDevices {
            session: self.id,
            token,
            switch,
            port,
        })
    }

    fn target(&self) -> Option<(SwitchId, PortId)> {
        Some((self.switch?, self.port?))
    }

    fn require_target(&self, what: &str) -> Result<(SwitchId, PortId), CoreError> {
        self.target()
            .ok_or_else(|| CoreError::validation(format!("{what} needs a selected port")))
    }

    // ── Settlements ─────────────────────────────────────────────────

    pub(crate) fn settle_tab_data(
        &mut self,
        token: RequestToken,
        outcome: Result<TabPayload, CollaboratorError>,
    ) -> Settlement {
        self.tab_data.settle(token, outcome)
    }

    pub(crate) fn settle_cable_test(
        &mut self,
        token: RequestToken,
        outcome: Result<CableReport, CollaboratorError>,
    ) -> Settlement {
        self.cable_test.settle(token, outcome)
    }

    pub(crate) fn settle_discovery(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<DiscoveredDevice>, CollaboratorError>,
    ) -> Settlement {
        self.discovery.settle(token, outcome)
    }
}

fn require_switch(inventory: &Inventory, switch: SwitchId) -> Result<(), CoreError> {
    inventory
        .find_switch(switch)
        .map(|_| ())
        .ok_or_else(|| CoreError::not_found("switch", switch))
}

fn require_port_on(inventory: &Inventory, switch: SwitchId, port: PortId) -> Result<(), CoreError> {
    match inventory.owner_of(port) {
        None => Err(CoreError::not_found("port", port)),
        Some(owner) if owner != switch => Err(CoreError::validation(format!(
            "port {port} belongs to switch {owner}, not switch {switch}"
        ))),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::inventory::fixtures::site;
    use serde_json::json;

    fn open_on(tokens: &mut SessionTokens, switch: u32, port: u32) -> (DiagnosticsSession, Vec<Effect>) {
        DiagnosticsSession::open(
            &site(),
            tokens,
            Some(SwitchId::new(switch)),
            Some(PortId::new(port)),
            ChartConfig::default(),
        )
        .unwrap()
    }

    fn tab_token(effects: &[Effect]) -> RequestToken {
        match effects {
            [Effect::LoadTabData { token, .. }] => *token,
            other => panic!("expected one tab load, got {other:?}"),
        }
    }

    #[test]
    fn open_with_port_starts_on_graph_and_loads() {
        let mut tokens = SessionTokens::default();
        let (session, effects) = open_on(&mut tokens, 1, 3);
        assert_eq!(session.tab(), Tab::Graph);
        assert_eq!(
            session.phase(),
            SessionPhase::PortSelected {
                switch: SwitchId::new(1),
                port: PortId::new(3)
            }
        );
        assert!(session.tab_data().is_loading());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn open_rejects_port_from_another_switch() {
        let mut tokens = SessionTokens::default();
        let result = DiagnosticsSession::open(
            &site(),
            &mut tokens,
            Some(SwitchId::new(1)),
            Some(PortId::new(5)),
            ChartConfig::default(),
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn open_unscoped_loads_nothing() {
        let mut tokens = SessionTokens::default();
        let (session, effects) =
            DiagnosticsSession::open(&site(), &mut tokens, None, None, ChartConfig::default())
                .unwrap();
        assert_eq!(session.phase(), SessionPhase::Unscoped);
        assert!(effects.is_empty());
        assert!(session.available_ports(&site()).is_empty());
    }

    #[test]
    fn selecting_another_switch_clears_port() {
        let inv = site();
        let mut tokens = SessionTokens::default();
        let (mut session, _) = open_on(&mut tokens, 1, 3);

        session.select_switch(&inv, SwitchId::new(2)).unwrap();
        assert_eq!(session.port(), None);
        assert!(!session.tab_data().is_loading());
        assert_eq!(session.available_ports(&inv).len(), 2);
    }

    #[test]
    fn select_port_without_switch_is_rejected() {
        let inv = site();
        let mut tokens = SessionTokens::default();
        let (mut session, _) =
            DiagnosticsSession::open(&inv, &mut tokens, None, None, ChartConfig::default())
                .unwrap();
        let before = session.clone();
        assert!(session.select_port(&inv, &mut tokens, PortId::new(1)).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn last_tab_wins() {
        let mut tokens = SessionTokens::default();
        let (mut session, _) = open_on(&mut tokens, 1, 3);

        let t1 = tab_token(&session.change_tab(&mut tokens, Tab::Diagnostics));
        let t2 = tab_token(&session.change_tab(&mut tokens, Tab::Graph));

        let second = TabPayload {
            tab: Tab::Graph,
            body: json!({ "samples": [2] }),
        };
        assert_eq!(
            session.settle_tab_data(t2, Ok(second.clone())),
            Settlement::Applied
        );
        let first = TabPayload {
            tab: Tab::Diagnostics,
            body: json!({ "samples": [1] }),
        };
        assert_eq!(session.settle_tab_data(t1, Ok(first)), Settlement::Stale);

        assert!(!session.tab_data().is_loading());
        assert_eq!(session.tab_data().value(), Some(&second));
    }

    #[test]
    fn change_tab_without_port_supersedes_load() {
        let inv = site();
        let mut tokens = SessionTokens::default();
        let (mut session, effects) = open_on(&mut tokens, 1, 3);
        let stale = tab_token(&effects);

        session.select_switch(&inv, SwitchId::new(1)).unwrap();
        assert!(session.change_tab(&mut tokens, Tab::Diagnostics).is_empty());
        assert_eq!(session.tab(), Tab::Diagnostics);
        assert_eq!(
            session.settle_tab_data(
                stale,
                Ok(TabPayload {
                    tab: Tab::Graph,
                    body: json!(null)
                })
            ),
            Settlement::Stale
        );
    }

    #[test]
    fn one_cable_test_at_a_time() {
        let mut tokens = SessionTokens::default();
        let (mut session, _) = open_on(&mut tokens, 1, 3);
        session.run_cable_test(&mut tokens).unwrap();
        assert!(session.run_cable_test(&mut tokens).is_err());
        assert!(session.cable_test().is_loading());
        assert!(!session.discovery().is_loading());
    }

    #[test]
    fn port_actions_need_a_port() {
        let inv = site();
        let mut tokens = SessionTokens::default();
        let (mut session, _) =
            DiagnosticsSession::open(&inv, &mut tokens, Some(SwitchId::new(2)), None, ChartConfig::default())
                .unwrap();
        assert!(session.run_cable_test(&mut tokens).is_err());
        assert!(session.discover_devices(&mut tokens).is_err());
    }

    #[test]
    fn interval_clamps() {
        let mut tokens = SessionTokens::default();
        let (mut session, _) = open_on(&mut tokens, 1, 3);
        for _ in 0..8 {
            session.step_interval(IntervalStep::Longer);
        }
        assert_eq!(session.chart().interval, TimeInterval::OneDay);
        session.set_interval(TimeInterval::FiveMinutes);
        session.step_interval(IntervalStep::Shorter);
        assert_eq!(session.chart().interval, TimeInterval::FiveMinutes);
    }

    #[test]
    fn session_ids_and_tokens_keep_rising() {
        let mut tokens = SessionTokens::default();
        let (first, e1) = open_on(&mut tokens, 1, 3);
        let (second, e2) = open_on(&mut tokens, 1, 3);
        assert!(second.id() > first.id());
        assert!(tab_token(&e2) > tab_token(&e1));
    }
}
