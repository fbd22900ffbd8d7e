//! Configuration for the netdesk console.
//!
//! TOML file plus `NETDESK_` environment overrides, token resolution, and
//! translation to `netdesk_core::ConsoleConfig`. The CLI layers its own
//! flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netdesk_core::{
    ChartConfig, ChartKind, ConsoleConfig, ConsoleSettings, TimeInterval, TlsVerification,
};

/// Placeholder written in place of secrets by [`Config::redacted`].
pub const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSection,
    pub diagnostics: DiagnosticsSection,
    pub polling: PollingSection,
    pub logging: LoggingSection,
}

/// How to reach the collaborator backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSection {
    /// Base URL (e.g., "https://netdesk.lan/api/").
    pub url: Option<String>,

    /// Bearer token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    pub timeout_secs: u64,

    /// Accept invalid certificates.
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            token_env: None,
            timeout_secs: 30,
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Chart settings every diagnostics session starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsSection {
    pub chart: ChartKind,
    pub interval: TimeInterval,
    pub realtime: bool,
}

/// Background polling intervals in seconds. 0 disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingSection {
    pub refresh_interval_secs: u64,
    pub auto_block_poll_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        let settings = ConsoleSettings::default();
        Self {
            refresh_interval_secs: settings.refresh_interval_secs,
            auto_block_poll_secs: settings.auto_block_poll_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Emit JSON log lines instead of the human formatter.
    pub json: bool,
}

impl Config {
    pub fn console_settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            chart_defaults: ChartConfig {
                kind: self.diagnostics.chart,
                realtime: self.diagnostics.realtime,
                interval: self.diagnostics.interval,
            },
            refresh_interval_secs: self.polling.refresh_interval_secs,
            auto_block_poll_secs: self.polling.auto_block_poll_secs,
        }
    }

    /// A copy safe to print: the plaintext token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.backend.token.is_some() {
            copy.backend.token = Some(REDACTED.into());
        }
        copy
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "netdesk", "netdesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netdesk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path` (if it exists), then `NETDESK_*` variables with
/// `__` separating nested keys (`NETDESK_BACKEND__URL`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETDESK_").split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Resolve the bearer token: `token_env` variable first, then the
/// plaintext `token`. No token is fine; the backend may not require one.
pub fn resolve_token(backend: &BackendSection) -> Option<SecretString> {
    if let Some(ref env_name) = backend.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    backend.token.clone().map(SecretString::from)
}

/// Build a `ConsoleConfig` from a loaded config, no CLI flag overrides.
pub fn to_console_config(cfg: &Config) -> Result<ConsoleConfig, ConfigError> {
    let raw = cfg
        .backend
        .url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation {
            field: "backend.url".into(),
            reason: "not set (config file or NETDESK_BACKEND__URL)".into(),
        })?;
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "backend.url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;

    let tls = if cfg.backend.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.backend.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ConsoleConfig {
        url,
        token: resolve_token(&cfg.backend),
        tls,
        timeout: Duration::from_secs(cfg.backend.timeout_secs),
        settings: cfg.console_settings(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
[backend]
url = "https://netdesk.lan/api/"
token = "plain-token"
timeout_secs = 10

[diagnostics]
chart = "errors"
interval = "1h"
realtime = true

[polling]
refresh_interval_secs = 0
"#;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.backend.timeout_secs, 30);
        assert_eq!(cfg.polling.auto_block_poll_secs, 30);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.backend.url.as_deref(), Some("https://netdesk.lan/api/"));
        assert_eq!(cfg.backend.timeout_secs, 10);
        assert_eq!(cfg.diagnostics.chart, ChartKind::Errors);
        assert_eq!(cfg.diagnostics.interval, TimeInterval::OneHour);
        assert!(cfg.diagnostics.realtime);
        assert_eq!(cfg.polling.refresh_interval_secs, 0);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.polling.auto_block_poll_secs, 30);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn unknown_chart_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[diagnostics]\nchart = \"pie\"\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.backend.url = Some("http://127.0.0.1:8080/".into());
        cfg.logging.json = true;

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("NETDESK_BACKEND__TIMEOUT_SECS", "5");
            jail.set_env("NETDESK_LOGGING__JSON", "true");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.backend.timeout_secs, 5);
            assert!(cfg.logging.json);
            assert_eq!(cfg.backend.url.as_deref(), Some("https://netdesk.lan/api/"));
            Ok(())
        });
    }

    #[test]
    fn token_env_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NETDESK_TEST_TOKEN", "from-env");
            let backend = BackendSection {
                token: Some("plain".into()),
                token_env: Some("NETDESK_TEST_TOKEN".into()),
                ..BackendSection::default()
            };
            assert_eq!(resolve_token(&backend).unwrap().expose_secret(), "from-env");

            let unset = BackendSection {
                token_env: Some("NETDESK_UNSET_TOKEN".into()),
                ..backend
            };
            assert_eq!(resolve_token(&unset).unwrap().expose_secret(), "plain");
            Ok(())
        });
    }

    #[test]
    fn console_config_translation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_config_from(&path).unwrap();

        let console = to_console_config(&cfg).unwrap();
        assert_eq!(console.url.as_str(), "https://netdesk.lan/api/");
        assert_eq!(console.timeout, Duration::from_secs(10));
        assert_eq!(console.tls, TlsVerification::SystemDefaults);
        assert_eq!(console.token.unwrap().expose_secret(), "plain-token");
        assert_eq!(console.settings.chart_defaults.kind, ChartKind::Errors);
        assert_eq!(console.settings.refresh_interval_secs, 0);
    }

    #[test]
    fn insecure_takes_precedence_over_ca_cert() {
        let mut cfg = Config::default();
        cfg.backend.url = Some("https://netdesk.lan/".into());
        cfg.backend.ca_cert = Some(PathBuf::from("/etc/netdesk/ca.pem"));
        assert_eq!(
            to_console_config(&cfg).unwrap().tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/netdesk/ca.pem"))
        );

        cfg.backend.insecure = true;
        assert_eq!(
            to_console_config(&cfg).unwrap().tls,
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn missing_or_bad_url_is_validation() {
        let mut cfg = Config::default();
        assert!(matches!(
            to_console_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.url"
        ));

        cfg.backend.url = Some("not a url".into());
        assert!(matches!(
            to_console_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn redacted_masks_token_only() {
        let mut cfg = Config::default();
        cfg.backend.token = Some("s3cret".into());
        cfg.backend.url = Some("https://netdesk.lan/".into());

        let shown = cfg.redacted();
        assert_eq!(shown.backend.token.as_deref(), Some(REDACTED));
        assert_eq!(shown.backend.url, cfg.backend.url);
        assert_eq!(Config::default().redacted().backend.token, None);
    }
}
