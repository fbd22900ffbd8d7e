// ── Collaborator seams ──
//
// The three services the console talks to. The runtime only ever sees these
// traits; `BackendClient` implements all three over one HTTP surface, tests
// substitute an in-process fake.

use std::future::Future;

use netdesk_api::BackendClient;
use netdesk_api::types::{DeletePortsRequest, PortSpeedRequest, PortStatusRequest};

use crate::command::ReconfigureParams;
use crate::convert::{reconfigure_request, telemetry_query};
use crate::error::CollaboratorError;
use crate::model::{
    AddressEntry, AutoBlockEvidence, CableReport, ChartConfig, ConnectionPoint, ConnectionPolicy,
    DiscoveredDevice, LinkState, PortId, SiteSnapshot, SpeedSetting, SwitchId, Tab, TabPayload,
};

type Outcome<T> = Result<T, CollaboratorError>;

/// Inventory and policy writes, plus the snapshot they are read back from.
pub trait Provisioning: Send + Sync + 'static {
    fn fetch_snapshot(&self) -> impl Future<Output = Outcome<SiteSnapshot>> + Send;

    fn add_switch(&self) -> impl Future<Output = Outcome<SwitchId>> + Send;

    fn add_port(&self, switch: SwitchId) -> impl Future<Output = Outcome<PortId>> + Send;

    fn delete_ports(&self, ports: &[PortId]) -> impl Future<Output = Outcome<()>> + Send;

    fn reconfigure_ports(
        &self,
        ports: &[PortId],
        params: ReconfigureParams,
    ) -> impl Future<Output = Outcome<()>> + Send;

    /// Push the whole policy; the backend replaces what it holds.
    fn apply_policy(&self, policy: &ConnectionPolicy) -> impl Future<Output = Outcome<()>> + Send;

    fn update_address(&self, entry: &AddressEntry) -> impl Future<Output = Outcome<()>> + Send;

    fn update_connection(
        &self,
        connection: &ConnectionPoint,
    ) -> impl Future<Output = Outcome<()>> + Send;
}

/// Per-port diagnostics and link control. No call is retried implicitly.
pub trait Telemetry: Send + Sync + 'static {
    fn load_tab_data(
        &self,
        switch: SwitchId,
        port: PortId,
        tab: Tab,
        chart: ChartConfig,
    ) -> impl Future<Output = Outcome<TabPayload>> + Send;

    fn run_cable_test(
        &self,
        switch: SwitchId,
        port: PortId,
    ) -> impl Future<Output = Outcome<CableReport>> + Send;

    fn discover_devices(
        &self,
        switch: SwitchId,
        port: PortId,
    ) -> impl Future<Output = Outcome<Vec<DiscoveredDevice>>> + Send;

    /// Resolves to the state the port was actually put in.
    fn set_port_status(
        &self,
        port: PortId,
        state: LinkState,
    ) -> impl Future<Output = Outcome<LinkState>> + Send;

    fn set_port_speed(
        &self,
        port: PortId,
        speed: SpeedSetting,
    ) -> impl Future<Output = Outcome<SpeedSetting>> + Send;
}

/// Source of auto-block evidence.
pub trait PolicyEnforcement: Send + Sync + 'static {
    /// Latest evidence, or `None` while nothing is blocked.
    fn auto_block_evidence(&self) -> impl Future<Output = Outcome<Option<AutoBlockEvidence>>> + Send;
}

/// Everything the console runtime needs from its collaborators.
pub trait Backend: Provisioning + Telemetry + PolicyEnforcement {}

impl<T: Provisioning + Telemetry + PolicyEnforcement> Backend for T {}

// ── HTTP implementation ─────────────────────────────────────────────

impl Provisioning for BackendClient {
    async fn fetch_snapshot(&self) -> Outcome<SiteSnapshot> {
        self.get_site().await?.try_into()
    }

    async fn add_switch(&self) -> Outcome<SwitchId> {
        Ok(SwitchId::new(self.create_switch().await?.id))
    }

    async fn add_port(&self, switch: SwitchId) -> Outcome<PortId> {
        Ok(PortId::new(self.create_port(switch.get()).await?.id))
    }

    async fn delete_ports(&self, ports: &[PortId]) -> Outcome<()> {
        let body = DeletePortsRequest {
            port_ids: ports.iter().map(|p| p.get()).collect(),
        };
        Ok(BackendClient::delete_ports(self, &body).await?)
    }

    async fn reconfigure_ports(&self, ports: &[PortId], params: ReconfigureParams) -> Outcome<()> {
        Ok(BackendClient::reconfigure_ports(self, &reconfigure_request(ports, params)).await?)
    }

    async fn apply_policy(&self, policy: &ConnectionPolicy) -> Outcome<()> {
        Ok(self.update_policy(&policy.into()).await?)
    }

    async fn update_address(&self, entry: &AddressEntry) -> Outcome<()> {
        Ok(BackendClient::update_address(self, &entry.into()).await?)
    }

    async fn update_connection(&self, connection: &ConnectionPoint) -> Outcome<()> {
        Ok(BackendClient::update_connection(self, &connection.into()).await?)
    }
}

impl Telemetry for BackendClient {
    async fn load_tab_data(
        &self,
        switch: SwitchId,
        port: PortId,
        tab: Tab,
        chart: ChartConfig,
    ) -> Outcome<TabPayload> {
        let query = telemetry_query(tab, chart);
        self.get_tab_data(switch.get(), port.get(), &query)
            .await?
            .try_into()
    }

    async fn run_cable_test(&self, switch: SwitchId, port: PortId) -> Outcome<CableReport> {
        Ok(BackendClient::run_cable_test(self, switch.get(), port.get())
            .await?
            .into())
    }

    async fn discover_devices(
        &self,
        switch: SwitchId,
        port: PortId,
    ) -> Outcome<Vec<DiscoveredDevice>> {
        self.list_port_devices(switch.get(), port.get())
            .await?
            .into_iter()
            .map(DiscoveredDevice::try_from)
            .collect()
    }

    async fn set_port_status(&self, port: PortId, state: LinkState) -> Outcome<LinkState> {
        let body = PortStatusRequest {
            state: state.to_string(),
        };
        BackendClient::set_port_status(self, port.get(), &body).await?;
        Ok(state)
    }

    async fn set_port_speed(&self, port: PortId, speed: SpeedSetting) -> Outcome<SpeedSetting> {
        let body = PortSpeedRequest {
            speed: speed.to_string(),
        };
        BackendClient::set_port_speed(self, port.get(), &body).await?;
        Ok(speed)
    }
}

impl PolicyEnforcement for BackendClient {
    async fn auto_block_evidence(&self) -> Outcome<Option<AutoBlockEvidence>> {
        self.get_auto_block()
            .await?
            .map(AutoBlockEvidence::try_from)
            .transpose()
    }
}
