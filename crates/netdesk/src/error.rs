//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netdesk_config::ConfigError;
use netdesk_core::{CollaboratorError, CollaboratorErrorKind, CoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend")]
    #[diagnostic(
        code(netdesk::connection_failed),
        help(
            "Check that the backend is running and the URL is right.\n\
             Use --insecure (-k) for self-signed certificates."
        )
    )]
    ConnectionFailed {
        #[source]
        source: CollaboratorError,
    },

    #[error("Backend did not answer in time")]
    #[diagnostic(
        code(netdesk::timeout),
        help("Increase the timeout with --timeout or backend.timeout_secs.")
    )]
    Timeout {
        #[source]
        source: CollaboratorError,
    },

    #[error("Backend rejected the request ({kind}): {message}")]
    #[diagnostic(code(netdesk::backend))]
    Backend {
        kind: CollaboratorErrorKind,
        message: String,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netdesk::not_found),
        help("Run: netdesk {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No backend URL configured")]
    #[diagnostic(
        code(netdesk::no_backend),
        help(
            "Pass --url, set NETDESK_URL, or add [backend] url to\n\
             {path}"
        )
    )]
    NoBackend { path: String },

    #[error(transparent)]
    #[diagnostic(code(netdesk::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Operation failed: {message}")]
    #[diagnostic(
        code(netdesk::operation_failed),
        help("The site was re-read afterwards; list it again to see the backend's view.")
    )]
    OperationFailed { message: String },

    #[error("Console stopped before the command finished")]
    #[diagnostic(code(netdesk::stopped))]
    Stopped,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(netdesk::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::VALIDATION,
            Self::NoBackend { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CollaboratorError> for CliError {
    fn from(err: CollaboratorError) -> Self {
        match err.kind {
            CollaboratorErrorKind::Unreachable => CliError::ConnectionFailed { source: err },
            CollaboratorErrorKind::Timeout => CliError::Timeout { source: err },
            CollaboratorErrorKind::NotFound => CliError::NotFound {
                resource_type: "backend resource".into(),
                identifier: err.message,
                list_command: "switches".into(),
            },
            kind => CliError::Backend {
                kind,
                message: err.message,
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },
            CoreError::Collaborator(e) => e.into(),
            CoreError::Config { message } => CliError::Validation {
                field: "backend.url".into(),
                reason: message,
            },
            CoreError::ConsoleStopped => CliError::Stopped,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "address" => "addresses",
        "port" => "ports <switch>",
        _ => "switches",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_kinds_map_to_exit_codes() {
        let unreachable = CollaboratorError::new(CollaboratorErrorKind::Unreachable, "refused");
        assert_eq!(CliError::from(unreachable).exit_code(), exit_code::CONNECTION);

        let timeout = CollaboratorError::new(CollaboratorErrorKind::Timeout, "slow");
        assert_eq!(CliError::from(timeout).exit_code(), exit_code::TIMEOUT);

        let rejected = CollaboratorError::new(CollaboratorErrorKind::Rejected, "uplink port");
        assert_eq!(CliError::from(rejected).exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn core_errors_map_to_exit_codes() {
        let validation = CoreError::Validation {
            message: "no ports selected".into(),
        };
        assert_eq!(CliError::from(validation).exit_code(), exit_code::VALIDATION);

        let missing = CoreError::NotFound {
            entity_type: "switch".into(),
            identifier: "9".into(),
        };
        assert_eq!(CliError::from(missing).exit_code(), exit_code::NOT_FOUND);
    }
}
