//! CLI configuration -- thin wrapper around `acsgate_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--nbi-url, --api-key, etc.).

use secrecy::SecretString;

use acsgate_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use acsgate_config::{
    Config, Overrides, config_path, load_config, save_config, store_api_key,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Translate global flags plus the active profile into a `ControllerConfig`.
///
/// An explicitly requested profile must exist; the implicit default one
/// may be absent, in which case flags and built-in defaults apply.
pub fn build_controller_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ControllerConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    if global.profile.is_some() && !config.profiles.contains_key(&profile_name) {
        return Err(profile_not_found(profile_name, config));
    }

    let overrides = Overrides {
        nbi_url: global.nbi_url.clone(),
        api_key: global.api_key.clone().map(SecretString::from),
        insecure: global.insecure,
        timeout: global.timeout,
        no_connection_request: global.no_connection_request,
    };
    Ok(config.controller_config(&profile_name, &overrides)?)
}

pub fn profile_not_found(name: String, config: &Config) -> CliError {
    let available: Vec<_> = config.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
