//! CLI flag overrides on top of `netdesk_config`.
//!
//! Core never sees these types: it receives a pre-built `ConsoleConfig`.

use std::path::PathBuf;

use secrecy::SecretString;

use netdesk_config::Config;
use netdesk_core::ConsoleConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--config` if given, otherwise the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(netdesk_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(netdesk_config::load_config_from(&config_file(global))?)
}

/// Merge flags into the loaded config and translate it. Background polling
/// is disabled: one invocation runs one command.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ConsoleConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(ref url) = global.url {
        cfg.backend.url = Some(url.clone());
    }
    if cfg.backend.url.is_none() {
        return Err(CliError::NoBackend {
            path: config_file(global).display().to_string(),
        });
    }
    if let Some(timeout) = global.timeout {
        cfg.backend.timeout_secs = timeout;
    }
    if global.insecure {
        cfg.backend.insecure = true;
    }

    let mut console = netdesk_config::to_console_config(&cfg)?;
    if let Some(ref token) = global.token {
        console.token = Some(SecretString::from(token.clone()));
    }
    console.settings = console.settings.oneshot();
    Ok(console)
}
