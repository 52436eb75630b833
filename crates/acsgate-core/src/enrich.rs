// ── Device enrichment ──
//
// Composes the resolvers into one flat, scheme-independent summary per
// document. Pure: the same document and options always produce the same
// summary.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;

use crate::config::WlanPolicy;
use crate::document::Document;
use crate::resolve::{
    Management, SsidPair, pick_subscriber_tag, resolve_identity, resolve_lan_ipv4,
    resolve_management, resolve_ssids, resolve_wan_ipv4,
};
use crate::schema::Scheme;

// ── Cutoff ───────────────────────────────────────────────────────────

/// A recency threshold on the last-contact timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cutoff {
    instant: DateTime<Utc>,
    text: String,
}

impl Cutoff {
    /// The instant `window_secs` before `now`.
    pub fn before(now: DateTime<Utc>, window_secs: u64) -> Self {
        let instant = i64::try_from(window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            instant,
            text: instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// RFC 3339 rendering, as sent to the controller in range filters.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether a last-contact timestamp is at or after the cutoff.
    ///
    /// Compares instants when the timestamp parses, and falls back to
    /// comparing the text otherwise.
    pub fn admits(&self, last_inform: &str) -> bool {
        match DateTime::parse_from_rfc3339(last_inform) {
            Ok(ts) => ts.with_timezone(&Utc) >= self.instant,
            Err(_) => last_inform >= self.text.as_str(),
        }
    }
}

// ── DeviceSummary ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub wan_ipv4: Option<String>,
    pub lan_ipv4: Option<String>,
}

/// Flattened view of one device document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub device_id: String,
    pub serial_number: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub data_model: Option<Scheme>,
    pub last_inform: Option<String>,
    pub last_boot: Option<String>,
    /// Only set when a liveness cutoff was supplied.
    pub online: Option<bool>,
    /// WAN address, else LAN address.
    pub ip: Option<String>,
    pub network: NetworkSummary,
    pub wifi: SsidPair,
    pub mgmt: Management,
    pub tags: Vec<String>,
    pub subscriber: Option<String>,
}

/// Inputs to [`enrich`] besides the document itself.
#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions<'a> {
    pub wlan_policy: &'a WlanPolicy,
    pub subscriber_tag_prefixes: &'a [String],
    pub online_cutoff: Option<&'a Cutoff>,
}

pub fn enrich(doc: &Document, opts: &EnrichOptions<'_>) -> DeviceSummary {
    let identity = resolve_identity(doc);
    let network = NetworkSummary {
        wan_ipv4: resolve_wan_ipv4(doc),
        lan_ipv4: resolve_lan_ipv4(doc),
    };
    let last_inform = doc.last_inform().map(ToOwned::to_owned);
    let online = opts
        .online_cutoff
        .map(|cutoff| last_inform.as_deref().is_some_and(|li| cutoff.admits(li)));

    DeviceSummary {
        device_id: doc.id().unwrap_or_default().to_owned(),
        serial_number: identity.serial,
        vendor: identity.vendor,
        model: identity.model,
        firmware: identity.firmware,
        data_model: Scheme::detect(doc),
        last_inform,
        last_boot: doc.last_boot().map(ToOwned::to_owned),
        online,
        ip: network.wan_ipv4.clone().or_else(|| network.lan_ipv4.clone()),
        network,
        wifi: resolve_ssids(doc, opts.wlan_policy),
        mgmt: resolve_management(doc),
        tags: doc.tags().into_iter().map(ToOwned::to_owned).collect(),
        subscriber: pick_subscriber_tag(doc, opts.subscriber_tag_prefixes),
    }
}
