// ── Core error types ──
//
// User-facing errors from acsgate-core. Resolution never fails on data
// shape; only calls to the controller produce errors. The
// `From<acsgate_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants while keeping the controller's status and
// body intact.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Controller errors (relayed, not retried) ─────────────────────
    #[error("Controller returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status the controller answered with, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<acsgate_api::Error> for CoreError {
    fn from(err: acsgate_api::Error) -> Self {
        match err {
            acsgate_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if let Some(status) = e.status() {
                    CoreError::Upstream {
                        status: status.as_u16(),
                        body: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            acsgate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            acsgate_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            acsgate_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            acsgate_api::Error::InvalidHeader { name } => CoreError::Config {
                message: format!("Invalid value for the {name} header"),
            },
            acsgate_api::Error::Upstream { status, body } => CoreError::Upstream { status, body },
            acsgate_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected controller response: {message}"))
            }
        }
    }
}
