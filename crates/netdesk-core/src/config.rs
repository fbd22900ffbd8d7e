// ── Runtime connection configuration ──
//
// These types describe *how* to reach the backend and how the console
// runtime behaves. They carry the token and tuning, but never touch disk.
// The CLI constructs a `ConsoleConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use netdesk_api::{BackendClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::ChartConfig;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (lab backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Behaviour of the console runtime, independent of how the backend is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSettings {
    /// Chart configuration every new diagnostics session starts with.
    pub chart_defaults: ChartConfig,
    /// How often to re-fetch the site snapshot (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// How often to ask the enforcement side for auto-block evidence. 0 = never.
    pub auto_block_poll_secs: u64,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            chart_defaults: ChartConfig::default(),
            refresh_interval_secs: 300,
            auto_block_poll_secs: 30,
        }
    }
}

impl ConsoleSettings {
    /// No background polling; for single CLI invocations.
    pub fn oneshot(self) -> Self {
        Self {
            refresh_interval_secs: 0,
            auto_block_poll_secs: 0,
            ..self
        }
    }
}

/// Configuration for connecting to one backend.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend base URL (e.g., `https://netdesk.lan/api/`).
    pub url: Url,
    /// Bearer token attached to every request.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub settings: ConsoleSettings,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            settings: ConsoleSettings::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }

    /// Build the HTTP client for this backend. Nothing is sent yet.
    pub fn client(&self) -> Result<BackendClient, CoreError> {
        Ok(BackendClient::new(self.url.as_str(), &self.transport())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn transport_carries_tls_and_token() {
        let mut config = ConsoleConfig::new("https://netdesk.lan/api".parse().unwrap());
        config.tls = TlsVerification::DangerAcceptInvalid;
        config.token = Some(SecretString::from("s3cret".to_owned()));

        let transport = config.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.token.unwrap().expose_secret(), "s3cret");
    }

    #[test]
    fn oneshot_disables_polling() {
        let settings = ConsoleSettings::default().oneshot();
        assert_eq!(settings.refresh_interval_secs, 0);
        assert_eq!(settings.auto_block_poll_secs, 0);
    }

    #[test]
    fn client_builds_without_network() {
        let config = ConsoleConfig::new("http://127.0.0.1:9/".parse().unwrap());
        let client = config.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9/");
    }
}
