#![allow(clippy::unwrap_used)]

// Runtime tests against an in-process fake backend. Calls that need a
// controlled completion order wait on a `oneshot` gate the test releases.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::oneshot;

use netdesk_core::{
    AddressEntry, AddressStatus, AddressTable, AutoBlockEvidence, CableReport, ChartConfig,
    CollaboratorError, CollaboratorErrorKind, Command, ConnectionPoint, ConnectionPolicy, Console,
    ConsoleSettings, CoreError, DiscoveredDevice, InternetAccess, Inventory, LinkState,
    NoticeLevel, PairReport, PairStatus, PolicyEnforcement, Port, PortId, PortStatus,
    Provisioning, ReconfigureParams, SiteSnapshot, SpeedSetting, Switch, SwitchId, Tab,
    TabPayload, Telemetry,
};

// ── Fake backend ────────────────────────────────────────────────────

#[derive(Default)]
struct FakeBackend {
    fail_snapshot: bool,
    fail_policy: bool,
    fail_auto_block: bool,
    auto_block: Option<AutoBlockEvidence>,
    snapshots: AtomicUsize,
    calls: Mutex<Vec<String>>,
    deleted: Mutex<Vec<PortId>>,
    gates: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
}

impl FakeBackend {
    /// Hold calls of `key` until the returned sender fires.
    fn gate(&self, key: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key, rx);
        tx
    }

    async fn pass(&self, key: &'static str) {
        self.calls.lock().unwrap().push(key.to_owned());
        let gate = self.gates.lock().unwrap().remove(key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

fn unreachable_backend() -> CollaboratorError {
    CollaboratorError::new(CollaboratorErrorKind::Unreachable, "connection refused")
}

fn port(id: u32, number: u16, status: PortStatus) -> Port {
    Port {
        id: PortId::new(id),
        number,
        status,
        speed: "1 Gbps".into(),
        device: None,
    }
}

fn site() -> SiteSnapshot {
    let switch = |id: u32, name: &str, ports: Vec<Port>| Switch {
        id: SwitchId::new(id),
        name: name.into(),
        location: "Rack A".into(),
        model: "S5300".into(),
        ports,
    };
    SiteSnapshot {
        connection: ConnectionPoint {
            vlan: "01-0179".parse().unwrap(),
            description: "Board room".into(),
        },
        inventory: Inventory::new(vec![
            switch(
                1,
                "SW-1",
                vec![
                    port(1, 1, PortStatus::Active),
                    port(2, 2, PortStatus::Inactive),
                    port(3, 3, PortStatus::Active),
                ],
            ),
            switch(2, "SW-2", vec![port(4, 1, PortStatus::Blocked)]),
        ])
        .unwrap(),
        addresses: AddressTable::new(vec![AddressEntry {
            address: "10.190.1.160".parse().unwrap(),
            public: false,
            mac: None,
            hostname: "iMacPro".into(),
            vendor: None,
            status: AddressStatus::Active,
            lease_age: "16 min".into(),
            throughput: "9.89 kbit/s".into(),
            netmask: None,
            gateway: None,
            dns: Vec::new(),
            description: String::new(),
            mac_binding: None,
            arp: None,
        }]),
        policy: ConnectionPolicy::default(),
    }
}

impl Provisioning for FakeBackend {
    async fn fetch_snapshot(&self) -> Result<SiteSnapshot, CollaboratorError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.fail_snapshot {
            return Err(unreachable_backend());
        }
        let mut snapshot = site();
        let deleted = self.deleted.lock().unwrap().clone();
        snapshot.inventory = Inventory::new(
            snapshot
                .inventory
                .switches()
                .iter()
                .cloned()
                .map(|mut s| {
                    s.ports.retain(|p| !deleted.contains(&p.id));
                    s
                })
                .collect(),
        )
        .unwrap();
        Ok(snapshot)
    }

    async fn add_switch(&self) -> Result<SwitchId, CollaboratorError> {
        self.pass("add-switch").await;
        Ok(SwitchId::new(3))
    }

    async fn add_port(&self, _switch: SwitchId) -> Result<PortId, CollaboratorError> {
        self.pass("add-port").await;
        Ok(PortId::new(9))
    }

    async fn delete_ports(&self, ports: &[PortId]) -> Result<(), CollaboratorError> {
        self.pass("delete-ports").await;
        self.deleted.lock().unwrap().extend_from_slice(ports);
        Ok(())
    }

    async fn reconfigure_ports(
        &self,
        _ports: &[PortId],
        _params: ReconfigureParams,
    ) -> Result<(), CollaboratorError> {
        self.pass("reconfigure-ports").await;
        Ok(())
    }

    async fn apply_policy(&self, _policy: &ConnectionPolicy) -> Result<(), CollaboratorError> {
        self.pass("apply-policy").await;
        if self.fail_policy {
            return Err(CollaboratorError::new(
                CollaboratorErrorKind::Rejected,
                "policy locked by another operator",
            ));
        }
        Ok(())
    }

    async fn update_address(&self, _entry: &AddressEntry) -> Result<(), CollaboratorError> {
        self.pass("update-address").await;
        Ok(())
    }

    async fn update_connection(
        &self,
        _connection: &ConnectionPoint,
    ) -> Result<(), CollaboratorError> {
        self.pass("update-connection").await;
        Ok(())
    }
}

impl Telemetry for FakeBackend {
    async fn load_tab_data(
        &self,
        _switch: SwitchId,
        port: PortId,
        tab: Tab,
        _chart: ChartConfig,
    ) -> Result<TabPayload, CollaboratorError> {
        let key = match tab {
            Tab::Graph => "tab:graph",
            Tab::Diagnostics => "tab:diagnostics",
        };
        self.pass(key).await;
        Ok(TabPayload {
            tab,
            body: json!({ "port": port.get() }),
        })
    }

    async fn run_cable_test(
        &self,
        _switch: SwitchId,
        _port: PortId,
    ) -> Result<CableReport, CollaboratorError> {
        self.pass("cable-test").await;
        Ok(CableReport {
            category: "Cat5e".into(),
            pairs: vec![PairReport {
                pair: 1,
                status: PairStatus::Ok,
                length_m: Some(14.0),
            }],
        })
    }

    async fn discover_devices(
        &self,
        _switch: SwitchId,
        _port: PortId,
    ) -> Result<Vec<DiscoveredDevice>, CollaboratorError> {
        self.pass("discover-devices").await;
        Ok(Vec::new())
    }

    async fn set_port_status(
        &self,
        _port: PortId,
        state: LinkState,
    ) -> Result<LinkState, CollaboratorError> {
        self.pass("set-port-status").await;
        Ok(state)
    }

    async fn set_port_speed(
        &self,
        _port: PortId,
        speed: SpeedSetting,
    ) -> Result<SpeedSetting, CollaboratorError> {
        self.pass("set-port-speed").await;
        Ok(speed)
    }
}

impl PolicyEnforcement for FakeBackend {
    async fn auto_block_evidence(&self) -> Result<Option<AutoBlockEvidence>, CollaboratorError> {
        if self.fail_auto_block {
            return Err(unreachable_backend());
        }
        Ok(self.auto_block.clone())
    }
}

fn quiet() -> ConsoleSettings {
    ConsoleSettings::default().oneshot()
}

fn sw(id: u32) -> SwitchId {
    SwitchId::new(id)
}

fn p(id: u32) -> PortId {
    PortId::new(id)
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn start_loads_first_snapshot() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();

    let state = console.state();
    assert!(state.has_snapshot());
    assert_eq!(state.summary().switch_count, 2);
    assert_eq!(state.summary().active_ports, 2);
    assert!(state.disclosure().is_switch_expanded(sw(1)));

    console.shutdown().await;
}

#[tokio::test]
async fn start_fails_when_snapshot_fails() {
    let backend = FakeBackend {
        fail_snapshot: true,
        ..FakeBackend::default()
    };
    let Err(err) = Console::start(backend, quiet()).await else {
        panic!("start should fail");
    };
    assert!(matches!(
        err,
        CoreError::Collaborator(CollaboratorError {
            kind: CollaboratorErrorKind::Unreachable,
            ..
        })
    ));
}

#[tokio::test]
async fn commands_after_shutdown_are_refused() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    console.shutdown().await;
    assert!(matches!(
        console.execute(Command::Refresh).await,
        Err(CoreError::ConsoleStopped)
    ));
}

#[tokio::test]
async fn settlements_cannot_be_issued_by_the_operator() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    let result = console
        .execute(Command::AutoBlockObserved {
            evidence: AutoBlockEvidence {
                observed_at: chrono::Utc::now(),
                source: "91.219.24.200".parse().unwrap(),
                packets: 35,
                window_secs: 60,
            },
        })
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
    console.shutdown().await;
}

// ── Provisioning ────────────────────────────────────────────────────

#[tokio::test]
async fn delete_selected_ports_round_trip() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();

    console
        .execute(Command::TogglePort { port: p(2) })
        .await
        .unwrap();
    console
        .execute(Command::DeleteSelectedPorts { switch: sw(1) })
        .await
        .unwrap();
    assert!(console.state().selection().is_empty());

    let state = console.wait_idle().await.unwrap();
    assert!(!state.inventory().contains_port(p(2)));
    assert_eq!(state.rollup(sw(1)).unwrap().total, 2);

    console.shutdown().await;
}

#[tokio::test]
async fn rejected_command_reports_error_and_keeps_state() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    let before = console.state();

    let err = console
        .execute(Command::DeleteSelectedPorts { switch: sw(1) })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert_eq!(console.state().selection(), before.selection());
    assert_eq!(console.state().pending_operations().count(), 0);

    console.shutdown().await;
}

#[tokio::test]
async fn failed_policy_sync_notifies_and_refreshes() {
    let backend = FakeBackend {
        fail_policy: true,
        ..FakeBackend::default()
    };
    let console = Console::start(backend, quiet()).await.unwrap();

    console
        .execute(Command::SetInternetAccess {
            access: InternetAccess::Open,
        })
        .await
        .unwrap();
    let state = console.wait_idle().await.unwrap();

    // The follow-up snapshot restores what the backend actually holds.
    assert_eq!(state.policy().internet, InternetAccess::Closed);
    let notices = console.take_notices().await.unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(console.take_notices().await.unwrap().is_empty());

    console.shutdown().await;
}

#[tokio::test]
async fn port_link_change_updates_inventory() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    console
        .execute(Command::SetPortStatus {
            port: p(2),
            state: LinkState::Up,
        })
        .await
        .unwrap();
    let state = console.wait_idle().await.unwrap();
    assert_eq!(
        state.inventory().find_port(p(2)).unwrap().status,
        PortStatus::Active
    );
    console.shutdown().await;
}

#[tokio::test]
async fn state_stream_yields_current_then_updates() {
    use futures_util::StreamExt;

    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    let mut stream = console.subscribe().into_stream();

    let first = stream.next().await.unwrap();
    assert!(first.selection().is_empty());

    console
        .execute(Command::TogglePort { port: p(2) })
        .await
        .unwrap();
    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert!(next.selection().contains(p(2)));

    console.shutdown().await;
}

// ── Diagnostics ─────────────────────────────────────────────────────

#[tokio::test]
async fn last_tab_wins_when_older_load_finishes_last() {
    let backend = FakeBackend::default();
    let release_diagnostics = backend.gate("tab:diagnostics");
    let console = Console::start(backend, quiet()).await.unwrap();

    console
        .execute(Command::OpenDiagnostics {
            switch: Some(sw(1)),
            port: Some(p(3)),
        })
        .await
        .unwrap();
    console
        .execute(Command::ChangeTab {
            tab: Tab::Diagnostics,
        })
        .await
        .unwrap();
    console
        .execute(Command::ChangeTab { tab: Tab::Graph })
        .await
        .unwrap();

    let state = console.wait_idle().await.unwrap();
    let session = state.diagnostics().unwrap();
    assert_eq!(session.tab(), Tab::Graph);
    assert_eq!(session.tab_data().value().unwrap().tab, Tab::Graph);

    // Let the superseded load finish; its settlement changes nothing.
    let mut stream = console.subscribe();
    release_diagnostics.send(()).unwrap();
    let after = stream.changed().await.unwrap();
    let session = after.diagnostics().unwrap();
    assert_eq!(session.tab(), Tab::Graph);
    assert_eq!(session.tab_data().value().unwrap().tab, Tab::Graph);
    assert!(!session.tab_data().is_loading());

    console.shutdown().await;
}

#[tokio::test]
async fn cable_test_result_after_close_is_discarded() {
    let backend = FakeBackend::default();
    let release_cable = backend.gate("cable-test");
    let console = Console::start(backend, quiet()).await.unwrap();

    console
        .execute(Command::OpenDiagnostics {
            switch: Some(sw(1)),
            port: Some(p(1)),
        })
        .await
        .unwrap();
    console.execute(Command::RunCableTest).await.unwrap();
    assert!(matches!(
        console.execute(Command::RunCableTest).await,
        Err(CoreError::Validation { .. })
    ));

    console.execute(Command::CloseDiagnostics).await.unwrap();
    console
        .execute(Command::OpenDiagnostics {
            switch: Some(sw(1)),
            port: Some(p(1)),
        })
        .await
        .unwrap();
    console.wait_idle().await.unwrap();

    let mut stream = console.subscribe();
    release_cable.send(()).unwrap();
    let after = stream.changed().await.unwrap();
    let session = after.diagnostics().unwrap();
    assert_eq!(session.cable_test().value(), None);
    assert!(!session.cable_test().is_loading());

    console.shutdown().await;
}

#[tokio::test]
async fn cable_test_completes_for_open_session() {
    let console = Console::start(FakeBackend::default(), quiet()).await.unwrap();
    console
        .execute(Command::OpenDiagnostics {
            switch: Some(sw(2)),
            port: Some(p(4)),
        })
        .await
        .unwrap();
    console.execute(Command::RunCableTest).await.unwrap();

    let state = console.wait_idle().await.unwrap();
    let report = state.diagnostics().unwrap().cable_test().value().unwrap();
    assert_eq!(report.category, "Cat5e");
    assert!(!report.has_fault());

    console.shutdown().await;
}

// ── Background polling ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn auto_block_poll_engages_policy() {
    let backend = FakeBackend {
        auto_block: Some(AutoBlockEvidence {
            observed_at: chrono::Utc::now(),
            source: "91.219.24.200".parse().unwrap(),
            packets: 35,
            window_secs: 60,
        }),
        ..FakeBackend::default()
    };
    let settings = ConsoleSettings {
        auto_block_poll_secs: 5,
        ..quiet()
    };
    let console = Console::start(backend, settings).await.unwrap();
    assert!(!console.state().policy().auto_block.is_engaged());

    let mut stream = console.subscribe();
    let engaged = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let state = stream.changed().await.unwrap();
            if state.policy().auto_block.is_engaged() {
                return state;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(
        engaged.policy().auto_block.evidence().unwrap().packets,
        35
    );
    assert_eq!(engaged.notices().len(), 1);

    console.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_auto_block_poll_surfaces_a_notice() {
    let backend = FakeBackend {
        fail_auto_block: true,
        ..FakeBackend::default()
    };
    let settings = ConsoleSettings {
        auto_block_poll_secs: 5,
        ..quiet()
    };
    let console = Console::start(backend, settings).await.unwrap();

    let mut stream = console.subscribe();
    let noticed = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let state = stream.changed().await.unwrap();
            if !state.notices().is_empty() {
                return state;
            }
        }
    })
    .await
    .unwrap();

    let notice = &noticed.notices()[0];
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert!(notice.message.contains("auto-block poll"));
    assert!(!noticed.policy().auto_block.is_engaged());

    console.shutdown().await;
}
