// ── Metrics aggregation ──
//
// Snapshot shapes and the arithmetic behind them. The controller supplies
// raw counts and sampled documents; everything here is pure.

use std::collections::BTreeMap;

use acsgate_api::DeviceCount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::resolve::{resolve_firmware, resolve_model};

/// Bucket name for documents that report no value.
pub const UNKNOWN: &str = "UNKNOWN";

/// Recency windows, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsWindows {
    /// A device seen within this window counts as online.
    pub online_secs: u64,
    /// A device seen within this window counts as active.
    pub active_secs: u64,
}

impl Default for MetricsWindows {
    fn default() -> Self {
        Self {
            online_secs: 600,
            active_secs: 86_400,
        }
    }
}

// ── Overview ─────────────────────────────────────────────────────────

/// Point-in-time fleet counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewSnapshot {
    pub generated_at: DateTime<Utc>,
    pub total_devices: u64,
    pub online_now: u64,
    pub active_24h: u64,
    /// `total_devices - active_24h`, floored at zero.
    pub offline_24h: u64,
    /// Set when any count came from a capped fetch.
    pub approximate: bool,
    pub windows: MetricsWindows,
}

impl OverviewSnapshot {
    /// Build a snapshot from the three raw counts.
    ///
    /// The counts are issued as separate queries, so devices informing in
    /// between can make them disagree. They are clamped so that
    /// `online_now <= active_24h <= total_devices` holds whenever the
    /// online window is no wider than the active window.
    pub fn from_counts(
        generated_at: DateTime<Utc>,
        windows: MetricsWindows,
        total: DeviceCount,
        online: DeviceCount,
        active: DeviceCount,
    ) -> Self {
        let total_devices = total.value;
        let active_24h = active.value.min(total_devices);
        let online_now = if windows.online_secs <= windows.active_secs {
            online.value.min(active_24h)
        } else {
            online.value.min(total_devices)
        };
        Self {
            generated_at,
            total_devices,
            online_now,
            active_24h,
            offline_24h: total_devices.saturating_sub(active_24h),
            approximate: !(total.exact && online.exact && active.exact),
            windows,
        }
    }
}

// ── Distribution ─────────────────────────────────────────────────────

/// Model and firmware histograms over a bounded sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub generated_at: DateTime<Utc>,
    /// Number of documents the histograms were built from.
    pub sampled: usize,
    pub product_class: BTreeMap<String, u64>,
    pub software_version: BTreeMap<String, u64>,
}

impl Distribution {
    pub fn from_documents<'a, I>(generated_at: DateTime<Utc>, docs: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut dist = Self {
            generated_at,
            sampled: 0,
            product_class: BTreeMap::new(),
            software_version: BTreeMap::new(),
        };
        for doc in docs {
            dist.sampled += 1;
            let model = resolve_model(doc).unwrap_or_else(|| UNKNOWN.to_owned());
            let firmware = resolve_firmware(doc).unwrap_or_else(|| UNKNOWN.to_owned());
            *dist.product_class.entry(model).or_default() += 1;
            *dist.software_version.entry(firmware).or_default() += 1;
        }
        dist
    }
}

// ── Last informs ─────────────────────────────────────────────────────

/// One row of the "most recently seen" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastInform {
    pub device_id: String,
    pub last_inform: Option<String>,
    pub product_class: Option<String>,
    pub software_version: Option<String>,
}

impl From<&Document> for LastInform {
    fn from(doc: &Document) -> Self {
        Self {
            device_id: doc.id().unwrap_or_default().to_owned(),
            last_inform: doc.last_inform().map(ToOwned::to_owned),
            product_class: resolve_model(doc),
            software_version: resolve_firmware(doc),
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────

/// Controller reachability probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub ok: bool,
    pub nbi: String,
    pub version: &'static str,
    pub now: DateTime<Utc>,
    /// Why the probe failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
