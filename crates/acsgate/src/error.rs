//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use acsgate_config::ConfigError;
use acsgate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const UPSTREAM: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the NBI at {url}")]
    #[diagnostic(
        code(acsgate::connection_failed),
        help(
            "{reason}\n\
             Check that the ACS is running and the NBI port is reachable.\n\
             Try: acsgate health --nbi-url <URL>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("NBI at {url} is not healthy")]
    #[diagnostic(code(acsgate::unhealthy))]
    Unhealthy { url: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(acsgate::timeout),
        help("Increase the timeout with --timeout or check the ACS responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("The NBI rejected the request (HTTP {status})")]
    #[diagnostic(
        code(acsgate::auth_failed),
        help(
            "The NBI may sit behind a gateway that requires an API key.\n\
             Set one with --api-key, ACS_API_KEY, or: acsgate config set-api-key"
        )
    )]
    AuthFailed { status: u16 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(acsgate::not_found),
        help("Run: acsgate {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Controller ───────────────────────────────────────────────────
    #[error("The ACS answered HTTP {status}: {body}")]
    #[diagnostic(code(acsgate::upstream))]
    Upstream { status: u16, body: String },

    #[error("{message}")]
    #[diagnostic(code(acsgate::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(acsgate::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(acsgate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: acsgate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(acsgate::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(acsgate::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(acsgate::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(acsgate::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Unhealthy { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Upstream { .. } => exit_code::UPSTREAM,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::Upstream { status, .. } if status == 401 || status == 403 => {
                CliError::AuthFailed { status }
            }

            CoreError::Upstream { status, body } => CliError::Upstream { status, body },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let upstream: CliError = CoreError::Upstream {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(upstream.exit_code(), exit_code::UPSTREAM);

        let auth: CliError = CoreError::Upstream {
            status: 401,
            body: String::new(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing: CliError = CoreError::DeviceNotFound {
            identifier: "x".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let timeout: CliError = CoreError::Timeout { timeout_secs: 0 }.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let invalid: CliError = CoreError::Validation {
            message: "bad".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
    }
}
