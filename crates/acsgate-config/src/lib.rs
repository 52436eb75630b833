//! Shared configuration for the acsgate CLI.
//!
//! TOML profiles, credential resolution (env + key file + keyring +
//! plaintext), and translation to `acsgate_core::ControllerConfig`. The
//! CLI layers its global flags on top through [`Overrides`].

use std::collections::BTreeMap;
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

use acsgate_core::{ControllerConfig, DEFAULT_NBI_URL, Delivery, TlsVerification, WlanPolicy};

/// Keyring service name; entries are keyed `<profile>/api-key`.
pub const KEYRING_SERVICE: &str = "acsgate";

/// Variables consulted for the API key when the profile names none.
const API_KEY_ENV_VARS: [&str; 2] = ["ACS_API_KEY", "GENIEACS_API_KEY"];

/// Variables naming a file that holds the API key.
const API_KEY_FILE_ENV_VARS: [&str; 2] = ["ACS_API_KEY_FILE", "GENIEACS_API_KEY_FILE"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("keyring error: {0}")]
    Keyring(String),

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
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
///
/// Unset tuning fields fall back to the `ControllerConfig` defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Profile {
    /// NBI base URL (e.g., "http://acs.example.net:7557").
    pub nbi_url: String,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// File whose trimmed content is the API key.
    pub api_key_file: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Ask the controller to contact the device right away (default true).
    pub connection_request: Option<bool>,

    /// Seconds the controller may wait for the device after a connection request.
    pub connection_request_timeout: Option<u64>,

    pub online_window_secs: Option<u64>,
    pub active_window_secs: Option<u64>,

    /// Upper bound for fallback counting.
    pub count_cap: Option<u32>,

    pub distribution_sample_limit: Option<u32>,

    pub subscriber_tag_prefixes: Option<Vec<String>>,

    /// Per-vendor legacy WLAN instance conventions.
    pub wlan_policy: Option<WlanPolicy>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            nbi_url: DEFAULT_NBI_URL.into(),
            api_key: None,
            api_key_env: None,
            api_key_file: None,
            timeout: None,
            insecure: None,
            ca_cert: None,
            connection_request: None,
            connection_request_timeout: None,
            online_window_secs: None,
            active_window_secs: None,
            count_cap: None,
            distribution_sample_limit: None,
            subscriber_tag_prefixes: None,
            wlan_policy: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "acsgate").map_or_else(
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
    p.push("acsgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path`, overlaid with `ACSGATE_`-prefixed
/// variables (nested keys split on `__`, e.g. `ACSGATE_DEFAULTS__OUTPUT`).
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ACSGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the API key from the credential chain (no CLI flag step).
///
/// The key is optional; `Ok(None)` means nothing is configured.
pub fn resolve_api_key(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<SecretString>, ConfigError> {
    resolve_api_key_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// [`resolve_api_key`] with an explicit environment lookup.
pub fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<SecretString>, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(key) = profile.api_key_env.as_deref().and_then(&env).and_then(non_blank) {
        return Ok(Some(SecretString::from(key)));
    }

    // 2. Well-known variables
    if let Some(key) = API_KEY_ENV_VARS
        .iter()
        .find_map(|name| env(name).and_then(non_blank))
    {
        return Ok(Some(SecretString::from(key)));
    }

    // 3. Key files
    let files = profile.api_key_file.iter().cloned().chain(
        API_KEY_FILE_ENV_VARS
            .iter()
            .filter_map(|name| env(name).and_then(non_blank))
            .map(PathBuf::from),
    );
    for path in files {
        if let Some(key) = read_key_file(&path)? {
            return Ok(Some(SecretString::from(key)));
        }
    }

    // 4. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Some(secret) = entry.get_password().ok().and_then(non_blank) {
            return Ok(Some(SecretString::from(secret)));
        }
    }

    // 5. Plaintext in config
    Ok(profile
        .api_key
        .clone()
        .and_then(non_blank)
        .map(SecretString::from))
}

/// Store an API key in the system keyring for `profile_name`.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    entry
        .set_password(key)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/api-key")
}

fn read_key_file(path: &Path) -> Result<Option<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Validation {
        field: "api_key_file".into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    Ok(non_blank(content.trim().to_owned()))
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// ── Translation to ControllerConfig ─────────────────────────────────

/// Values that take priority over the profile, typically CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub nbi_url: Option<String>,
    pub api_key: Option<SecretString>,
    /// Forces insecure TLS when set; never turns it off.
    pub insecure: bool,
    pub timeout: Option<u64>,
    /// Forces queued delivery when set.
    pub no_connection_request: bool,
}

impl Config {
    /// Resolve the active profile name from an explicit request and config.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(ToOwned::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Build a `ControllerConfig` for `profile_name`.
    ///
    /// A missing profile is treated as an empty one, so flags and the
    /// default URL alone are enough to reach a controller.
    pub fn controller_config(
        &self,
        profile_name: &str,
        overrides: &Overrides,
    ) -> Result<ControllerConfig, ConfigError> {
        let fallback = Profile::default();
        let profile = self.profiles.get(profile_name).unwrap_or(&fallback);
        let overrides = Overrides {
            timeout: overrides
                .timeout
                .or(profile.timeout)
                .or(Some(self.defaults.timeout)),
            ..overrides.clone()
        };
        profile_to_controller_config(profile, profile_name, &overrides)
    }
}

/// Build a `ControllerConfig` from a profile plus overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
) -> Result<ControllerConfig, ConfigError> {
    // 1. NBI URL (override > profile)
    let url_str = overrides.nbi_url.as_deref().unwrap_or(&profile.nbi_url);
    let url: url::Url = url_str.parse().map_err(|_| ConfigError::Validation {
        field: "nbi_url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "nbi_url".into(),
            reason: format!("expected an http or https URL, got '{url_str}'"),
        });
    }

    let mut config = ControllerConfig::new(url);

    // 2. API key (override > chain)
    config.api_key = match overrides.api_key {
        Some(ref key) => Some(key.clone()),
        None => resolve_api_key(profile, profile_name)?,
    };

    // 3. TLS verification
    config.tls = if overrides.insecure || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeout
    if let Some(secs) = overrides.timeout.or(profile.timeout) {
        config.timeout = Duration::from_secs(positive("timeout", secs)?);
    }

    // 5. Task delivery
    let defaults = Delivery::default();
    config.delivery = Delivery {
        connection_request: !overrides.no_connection_request
            && profile.connection_request.unwrap_or(defaults.connection_request),
        timeout: profile
            .connection_request_timeout
            .map(Duration::from_secs)
            .or(defaults.timeout),
    };

    // 6. Resolution and metrics tuning
    if let Some(secs) = profile.online_window_secs {
        config.windows.online_secs = secs;
    }
    if let Some(secs) = profile.active_window_secs {
        config.windows.active_secs = secs;
    }
    if let Some(cap) = profile.count_cap {
        config.count_cap = positive("count_cap", cap)?;
    }
    if let Some(limit) = profile.distribution_sample_limit {
        config.distribution_sample_limit = positive("distribution_sample_limit", limit)?;
    }
    if let Some(ref prefixes) = profile.subscriber_tag_prefixes {
        config.subscriber_tag_prefixes.clone_from(prefixes);
    }
    if let Some(ref policy) = profile.wlan_policy {
        config.wlan_policy = policy.clone();
    }

    Ok(config)
}

fn positive<T: PartialEq + Default>(field: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        })
    } else {
        Ok(value)
    }
}
