// Hand-crafted async HTTP client for the netdesk backend.
//
// Base path: {url}/v1/
// Auth: optional `Authorization: Bearer` header (see `TransportConfig`)

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the netdesk backend.
///
/// One instance serves all three collaborator roles; `netdesk-core`
/// implements its collaborator traits on top of it.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl BackendClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers and TLS).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: 0,
        })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/site"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        self.handle_response(resp).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + Sync>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} (with query)");

        let resp = self.send(self.http.get(url).query(query)).await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        self.handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        self.handle_empty(resp).await
    }

    async fn put_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        self.handle_empty(resp).await
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Error::Unauthorized;
        }
        if status == StatusCode::NOT_FOUND {
            return Error::NotFound {
                resource: resp.url().path().to_owned(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Backend {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Site snapshot ────────────────────────────────────────────────

    pub async fn get_site(&self) -> Result<types::SiteSnapshotResponse, Error> {
        self.get("v1/site").await
    }

    pub async fn update_connection(&self, body: &types::ConnectionPointDto) -> Result<(), Error> {
        self.put_no_response("v1/connection", body).await
    }

    // ── Provisioning ─────────────────────────────────────────────────

    pub async fn create_switch(&self) -> Result<types::CreatedResponse, Error> {
        self.post("v1/switches", &serde_json::json!({})).await
    }

    pub async fn create_port(&self, switch_id: u32) -> Result<types::CreatedResponse, Error> {
        self.post(
            &format!("v1/switches/{switch_id}/ports"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn delete_ports(&self, body: &types::DeletePortsRequest) -> Result<(), Error> {
        self.post_no_response("v1/ports/delete", body).await
    }

    pub async fn reconfigure_ports(
        &self,
        body: &types::ReconfigurePortsRequest,
    ) -> Result<(), Error> {
        self.post_no_response("v1/ports/reconfigure", body).await
    }

    pub async fn set_port_status(
        &self,
        port_id: u32,
        body: &types::PortStatusRequest,
    ) -> Result<(), Error> {
        self.put_no_response(&format!("v1/ports/{port_id}/status"), body)
            .await
    }

    pub async fn set_port_speed(
        &self,
        port_id: u32,
        body: &types::PortSpeedRequest,
    ) -> Result<(), Error> {
        self.put_no_response(&format!("v1/ports/{port_id}/speed"), body)
            .await
    }

    // ── IP table / policy ────────────────────────────────────────────

    pub async fn update_address(&self, body: &types::AddressDto) -> Result<(), Error> {
        self.put_no_response(&format!("v1/addresses/{}", body.ip), body)
            .await
    }

    pub async fn update_policy(&self, body: &types::PolicyDto) -> Result<(), Error> {
        self.put_no_response("v1/policy", body).await
    }

    /// Latest auto-block evidence, or `None` while nothing is blocked.
    pub async fn get_auto_block(&self) -> Result<Option<types::AutoBlockDto>, Error> {
        self.get("v1/policy/auto-block").await
    }

    // ── Telemetry ────────────────────────────────────────────────────

    pub async fn get_tab_data(
        &self,
        switch_id: u32,
        port_id: u32,
        query: &types::TelemetryQuery,
    ) -> Result<types::TabDataResponse, Error> {
        self.get_with_query(
            &format!("v1/switches/{switch_id}/ports/{port_id}/telemetry"),
            query,
        )
        .await
    }

    pub async fn run_cable_test(
        &self,
        switch_id: u32,
        port_id: u32,
    ) -> Result<types::CableTestResponse, Error> {
        self.post(
            &format!("v1/switches/{switch_id}/ports/{port_id}/cable-test"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn list_port_devices(
        &self,
        switch_id: u32,
        port_id: u32,
    ) -> Result<Vec<types::DiscoveredDeviceDto>, Error> {
        self.get(&format!("v1/switches/{switch_id}/ports/{port_id}/devices"))
            .await
    }
}
