// ── Core error types ──
//
// User-facing errors from netdesk-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<netdesk_api::Error>`
// impl folds transport errors into a cloneable `CollaboratorError`, which
// is what async settlements carry back into the state.

use serde::Serialize;
use thiserror::Error;

// ── Collaborator failures ────────────────────────────────────────────

/// Broad classification of a failed collaborator call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CollaboratorErrorKind {
    /// Connection refused, DNS failure, TLS failure.
    Unreachable,
    Timeout,
    Unauthorized,
    /// The backend understood the request and refused it.
    Rejected,
    NotFound,
    /// The backend answered with something the model cannot represent.
    Malformed,
}

/// Summary of a failed asynchronous collaborator call.
///
/// Cloneable so it can live inside async slots, notices and settlement
/// commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}: {message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Malformed, message)
    }

    /// Whether the operator might reasonably retry the same call.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            CollaboratorErrorKind::Unreachable | CollaboratorErrorKind::Timeout
        )
    }
}

impl From<netdesk_api::Error> for CollaboratorError {
    fn from(err: netdesk_api::Error) -> Self {
        use netdesk_api::Error as Api;

        let message = err.to_string();
        let kind = match &err {
            Api::Timeout { .. } => CollaboratorErrorKind::Timeout,
            Api::Transport(e) if e.is_timeout() => CollaboratorErrorKind::Timeout,
            Api::Transport(_) | Api::InvalidUrl(_) | Api::Tls(_) => {
                CollaboratorErrorKind::Unreachable
            }
            Api::Unauthorized => CollaboratorErrorKind::Unauthorized,
            Api::NotFound { .. } => CollaboratorErrorKind::NotFound,
            Api::Backend { status, .. } if *status >= 500 => CollaboratorErrorKind::Unreachable,
            Api::Backend { .. } => CollaboratorErrorKind::Rejected,
            Api::Deserialization { .. } => CollaboratorErrorKind::Malformed,
        };
        Self { kind, message }
    }
}

// ── Core errors ──────────────────────────────────────────────────────

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The command was rejected at the boundary; state is untouched.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The console runtime has shut down and no longer accepts commands.
    #[error("Console runtime stopped")]
    ConsoleStopped,
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }
}

impl From<netdesk_api::Error> for CoreError {
    fn from(err: netdesk_api::Error) -> Self {
        match err {
            netdesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            other => CoreError::Collaborator(other.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_rejection_becomes_rejected() {
        let err: CollaboratorError = netdesk_api::Error::Backend {
            status: 409,
            message: "port is an uplink".into(),
        }
        .into();
        assert_eq!(err.kind, CollaboratorErrorKind::Rejected);
        assert!(err.message.contains("port is an uplink"));
        assert!(!err.is_transient());
    }

    #[test]
    fn api_timeout_is_transient() {
        let err: CollaboratorError = netdesk_api::Error::Timeout { timeout_secs: 5 }.into();
        assert_eq!(err.kind, CollaboratorErrorKind::Timeout);
        assert!(err.is_transient());
    }

    #[test]
    fn display_includes_kind() {
        let err = CollaboratorError::malformed("unknown port status \"flapping\"");
        assert_eq!(
            err.to_string(),
            "malformed: unknown port status \"flapping\""
        );
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let parse_err = url::Url::parse("::").map(|_| ()).unwrap_err();
        let err: CoreError = netdesk_api::Error::InvalidUrl(parse_err).into();
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
