// ── Runtime controller configuration ──
//
// These types describe how to reach the controller and how to resolve
// device documents. They carry credential data and tuning, but never touch
// disk or the environment. The CLI builds a `ControllerConfig` and hands
// it in.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::command::requests::Delivery;
use crate::metrics::MetricsWindows;
use crate::schema::Band;

/// Controller URL used when nothing else is configured.
pub const DEFAULT_NBI_URL: &str = "http://localhost:7557";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

// ── Legacy WLAN policy ───────────────────────────────────────────────

/// Legacy WLAN instance conventions for one vendor family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandDefaults {
    /// Candidate `WLANConfiguration` instances for 2.4 GHz, in priority order.
    pub two_four: Vec<String>,
    /// Candidate instances for 5 GHz. The first one with an SSID wins,
    /// otherwise the last one.
    pub five: Vec<String>,
    /// Vendor-specific parameters naming the band of a WLAN instance.
    pub band_hint_params: Vec<String>,
}

impl Default for BandDefaults {
    fn default() -> Self {
        Self {
            two_four: vec!["1".into()],
            five: vec!["3".into(), "2".into()],
            band_hint_params: vec!["X_TP_Band".into()],
        }
    }
}

impl BandDefaults {
    pub fn candidates(&self, band: Band) -> &[String] {
        match band {
            Band::TwoFour => &self.two_four,
            Band::Five => &self.five,
        }
    }
}

/// Per-vendor legacy WLAN conventions.
///
/// `vendors` keys are matched case-insensitively as substrings of the
/// device manufacturer; the first match in key order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WlanPolicy {
    pub default: BandDefaults,
    pub vendors: BTreeMap<String, BandDefaults>,
}

impl WlanPolicy {
    pub fn for_vendor(&self, vendor: Option<&str>) -> &BandDefaults {
        let Some(vendor) = vendor.map(str::to_lowercase) else {
            return &self.default;
        };
        self.vendors
            .iter()
            .find(|(key, _)| !key.is_empty() && vendor.contains(&key.to_lowercase()))
            .map_or(&self.default, |(_, defaults)| defaults)
    }
}

// ── ControllerConfig ─────────────────────────────────────────────────

/// Configuration for one controller connection.
///
/// Built by the CLI, passed to `Controller`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// NBI base URL (e.g., `http://localhost:7557`).
    pub url: Url,
    /// Optional key sent as `X-API-Key` to an authenticating gateway.
    pub api_key: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Default delivery for submitted tasks.
    pub delivery: Delivery,
    /// Recency windows for liveness and overview metrics.
    pub windows: MetricsWindows,
    /// Upper bound for fallback counting when the controller has no count header.
    pub count_cap: u32,
    /// How many documents the distribution histogram samples.
    pub distribution_sample_limit: u32,
    /// Tag prefixes that mark a subscriber id (e.g. `sub:4411`).
    pub subscriber_tag_prefixes: Vec<String>,
    pub wlan_policy: WlanPolicy,
}

impl ControllerConfig {
    /// Defaults for everything but the URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            delivery: Delivery::default(),
            windows: MetricsWindows::default(),
            count_cap: 10_000,
            distribution_sample_limit: 2_000,
            subscriber_tag_prefixes: vec!["sub:".into()],
            wlan_policy: WlanPolicy::default(),
        }
    }
}
