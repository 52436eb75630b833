// ── Band resolver ──
//
// Picks the SSID and password parameter paths for one band. The chain,
// in order:
//   1. hierarchical band map (AccessPoint → SSID → Radio)
//   2. hierarchical defaults, when the document has no legacy tree
//   3. legacy WLAN instance with a matching vendor band hint
//   4. legacy WLAN instance with a matching 802.11 standard
//   5. legacy policy default (first candidate with an SSID, else the last)
// First match in enumeration order wins at every step.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::config::{BandDefaults, WlanPolicy};
use crate::document::{Document, Scalar};
use crate::resolve::identity::resolve_vendor;
use crate::schema::{Band, Scheme, band_map, paths};

static STANDARD_24: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b11(b|g|n)\b").ok());
static STANDARD_5: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b11(a|ac|ax)\b").ok());

/// Concrete parameter paths for one band's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiParams {
    pub band: Band,
    pub scheme: Scheme,
    pub ssid_path: String,
    pub password_path: String,
}

/// Resolve the SSID and password paths for `band`. Never fails: when no
/// heuristic matches, the documented default applies.
pub fn resolve_wifi_params(doc: &Document, band: Band, policy: &WlanPolicy) -> WifiParams {
    if let Some(binding) = band_map(doc).get(&band) {
        trace!(%band, ssid = %binding.ssid, ap = %binding.access_point, "hierarchical band map hit");
        return hierarchical(doc, band, &binding.ssid, &binding.access_point);
    }

    if doc.has_object(paths::HIERARCHICAL_ROOT) && !doc.has_object(paths::LEGACY_ROOT) {
        let instance = match band {
            Band::TwoFour => "1",
            Band::Five => "2",
        };
        trace!(%band, instance, "hierarchical default");
        return hierarchical(doc, band, instance, instance);
    }

    let vendor = resolve_vendor(doc);
    legacy(doc, band, policy.for_vendor(vendor.as_deref()))
}

/// Path of the SSID of `instance` under the legacy WLAN tree.
pub(crate) fn legacy_ssid_path(instance: &str) -> String {
    format!("{}.{instance}.SSID", paths::WLAN_CONFIGURATION)
}

/// Prefer `primary` when it holds a value or `alternate` holds none.
fn prefer(doc: &Document, primary: String, alternate: String) -> String {
    if doc.has_value(&primary) || !doc.has_value(&alternate) {
        primary
    } else {
        alternate
    }
}

fn hierarchical(doc: &Document, band: Band, ssid: &str, access_point: &str) -> WifiParams {
    let security = format!("{}.{access_point}.Security", paths::WIFI_ACCESS_POINT);
    WifiParams {
        band,
        scheme: Scheme::Hierarchical,
        ssid_path: format!("{}.{ssid}.SSID", paths::WIFI_SSID),
        password_path: prefer(
            doc,
            format!("{security}.KeyPassphrase"),
            format!("{security}.PreSharedKey"),
        ),
    }
}

fn legacy(doc: &Document, band: Band, defaults: &BandDefaults) -> WifiParams {
    let instances = doc.instances(paths::WLAN_CONFIGURATION);

    let target = match_band_hint(doc, &instances, band, &defaults.band_hint_params)
        .or_else(|| match_standard(doc, &instances, band))
        .unwrap_or_else(|| default_instance(doc, band, defaults.candidates(band)));
    trace!(%band, instance = %target, "legacy WLAN instance");

    let base = format!("{}.{target}", paths::WLAN_CONFIGURATION);
    WifiParams {
        band,
        scheme: Scheme::Legacy,
        ssid_path: format!("{base}.SSID"),
        password_path: prefer(
            doc,
            format!("{base}.PreSharedKey.1.KeyPassphrase"),
            format!("{base}.PreSharedKey.1.PreSharedKey"),
        ),
    }
}

fn text_at<'d>(doc: &'d Document, path: &str) -> Option<&'d str> {
    doc.get(path).and_then(Scalar::as_str)
}

/// Whether a vendor band hint such as `2.4GHz`, `5G`, or `5` names `band`.
pub(crate) fn hint_matches(hint: &str, band: Band) -> bool {
    let hint = hint.to_lowercase();
    match band {
        Band::TwoFour => hint.contains("2.4") || hint.contains("24"),
        Band::Five => {
            hint.contains("5g")
                || hint
                    .split(|c: char| !c.is_ascii_alphanumeric() && c != '.')
                    .any(|token| token == "5")
        }
    }
}

fn match_band_hint(
    doc: &Document,
    instances: &[&str],
    band: Band,
    hint_params: &[String],
) -> Option<String> {
    instances
        .iter()
        .find(|i| {
            hint_params.iter().any(|param| {
                let path = format!("{}.{i}.{param}", paths::WLAN_CONFIGURATION);
                text_at(doc, &path).is_some_and(|hint| hint_matches(hint, band))
            })
        })
        .map(|i| (*i).to_owned())
}

/// Whether an `802.11` standard string belongs to `band`.
pub(crate) fn standard_matches(standard: &str, band: Band) -> bool {
    let pattern = match band {
        Band::TwoFour => STANDARD_24.as_ref(),
        Band::Five => STANDARD_5.as_ref(),
    };
    pattern.is_some_and(|re| re.is_match(&standard.to_lowercase()))
}

fn match_standard(doc: &Document, instances: &[&str], band: Band) -> Option<String> {
    instances
        .iter()
        .find(|i| {
            let path = format!("{}.{i}.Standard", paths::WLAN_CONFIGURATION);
            text_at(doc, &path).is_some_and(|std| standard_matches(std, band))
        })
        .map(|i| (*i).to_owned())
}

fn default_instance(doc: &Document, band: Band, candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|c| doc.has_value(&legacy_ssid_path(c)))
        .or_else(|| candidates.last())
        .cloned()
        .unwrap_or_else(|| match band {
            Band::TwoFour => "1".to_owned(),
            Band::Five => "2".to_owned(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{tr098_gateway, tr181_gateway, v};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn legacy_doc(wlan: serde_json::Value) -> Document {
        Document::from(json!({
            "InternetGatewayDevice": { "LANDevice": { "1": { "WLANConfiguration": wlan } } }
        }))
    }

    #[test]
    fn hierarchical_five_ghz_follows_access_point() {
        let params = resolve_wifi_params(&tr181_gateway(), Band::Five, &WlanPolicy::default());
        assert_eq!(params.ssid_path, "Device.WiFi.SSID.2.SSID");
        assert_eq!(
            params.password_path,
            "Device.WiFi.AccessPoint.4.Security.KeyPassphrase"
        );
        assert_eq!(params.scheme, Scheme::Hierarchical);
    }

    #[test]
    fn hierarchical_password_prefers_populated_key() {
        // AP 1 has an empty KeyPassphrase (still a value) and a PreSharedKey.
        let params = resolve_wifi_params(&tr181_gateway(), Band::TwoFour, &WlanPolicy::default());
        assert_eq!(
            params.password_path,
            "Device.WiFi.AccessPoint.1.Security.KeyPassphrase"
        );

        let doc = Document::from(json!({ "Device": { "WiFi": {
            "Radio": { "1": { "OperatingFrequencyBand": v("2.4GHz") } },
            "SSID": { "1": { "LowerLayers": v("Device.WiFi.Radio.1.") } },
            "AccessPoint": { "1": {
                "SSIDReference": v("Device.WiFi.SSID.1."),
                "Security": { "PreSharedKey": v("abc") }
            } }
        } } }));
        let params = resolve_wifi_params(&doc, Band::TwoFour, &WlanPolicy::default());
        assert_eq!(
            params.password_path,
            "Device.WiFi.AccessPoint.1.Security.PreSharedKey"
        );
    }

    #[test]
    fn legacy_defaults_to_instance_three_when_populated() {
        let params = resolve_wifi_params(&tr098_gateway(), Band::Five, &WlanPolicy::default());
        assert_eq!(
            params.ssid_path,
            "InternetGatewayDevice.LANDevice.1.WLANConfiguration.3.SSID"
        );
        assert_eq!(
            params.password_path,
            "InternetGatewayDevice.LANDevice.1.WLANConfiguration.3.PreSharedKey.1.PreSharedKey"
        );
    }

    #[test]
    fn legacy_falls_back_to_instance_two() {
        let doc = legacy_doc(json!({
            "1": { "SSID": v("a") },
            "3": { "Enable": v(true) }
        }));
        let params = resolve_wifi_params(&doc, Band::Five, &WlanPolicy::default());
        assert!(params.ssid_path.ends_with(".2.SSID"), "{}", params.ssid_path);
        assert_eq!(
            params.password_path,
            "InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.PreSharedKey.1.KeyPassphrase"
        );
    }

    #[test]
    fn legacy_two_four_uses_passphrase() {
        let params = resolve_wifi_params(&tr098_gateway(), Band::TwoFour, &WlanPolicy::default());
        assert!(params.ssid_path.ends_with("WLANConfiguration.1.SSID"));
        assert!(params.password_path.ends_with("PreSharedKey.1.KeyPassphrase"));
    }

    #[test]
    fn band_hint_beats_standard_and_default() {
        let doc = legacy_doc(json!({
            "1": { "SSID": v("a"), "Standard": v("ac") , "X_TP_Band": v("2.4GHz") },
            "2": { "SSID": v("b"), "Standard": v("802.11ac") },
            "5": { "SSID": v("c"), "X_TP_Band": v("5GHz") }
        }));
        let params = resolve_wifi_params(&doc, Band::Five, &WlanPolicy::default());
        assert!(params.ssid_path.ends_with(".5.SSID"), "{}", params.ssid_path);
    }

    #[test]
    fn standard_used_when_no_hint() {
        let doc = legacy_doc(json!({
            "1": { "SSID": v("a"), "Standard": v("b,g,n") },
            "2": { "SSID": v("b"), "Standard": v("802.11ac") },
            "3": { "SSID": v("c") }
        }));
        let five = resolve_wifi_params(&doc, Band::Five, &WlanPolicy::default());
        assert!(five.ssid_path.ends_with(".2.SSID"), "{}", five.ssid_path);
    }

    #[test]
    fn vendor_policy_changes_default() {
        let mut policy = WlanPolicy::default();
        policy.vendors.insert(
            "acme".into(),
            BandDefaults {
                five: vec!["5".into()],
                ..BandDefaults::default()
            },
        );
        let doc = Document::from(json!({ "InternetGatewayDevice": {
            "DeviceInfo": { "Manufacturer": v("ACME Networks") },
            "LANDevice": { "1": { "WLANConfiguration": { "1": {}, "5": {} } } }
        } }));
        let params = resolve_wifi_params(&doc, Band::Five, &policy);
        assert!(params.ssid_path.ends_with(".5.SSID"), "{}", params.ssid_path);
    }

    #[test]
    fn hint_and_standard_matching() {
        assert!(hint_matches("2.4GHz", Band::TwoFour));
        assert!(hint_matches("24G", Band::TwoFour));
        assert!(hint_matches("5G", Band::Five));
        assert!(hint_matches("band 5", Band::Five));
        assert!(hint_matches("5", Band::Five));
        assert!(!hint_matches("15", Band::Five));
        assert!(!hint_matches("2.4GHz", Band::Five));

        assert!(standard_matches("802.11b/g/n", Band::TwoFour));
        assert!(standard_matches("11ax", Band::Five));
        assert!(!standard_matches("11ac", Band::TwoFour));
        assert!(!standard_matches("b,g,n", Band::TwoFour));
    }

    #[test]
    fn schemes_stay_isolated() {
        let policy = WlanPolicy::default();
        for band in Band::ALL {
            let legacy = resolve_wifi_params(&tr098_gateway(), band, &policy);
            assert!(legacy.ssid_path.starts_with("InternetGatewayDevice."));
            assert!(legacy.password_path.starts_with("InternetGatewayDevice."));

            let bare = Document::from(json!({ "Device": { "DeviceInfo": {} } }));
            let hier = resolve_wifi_params(&bare, band, &policy);
            assert!(hier.ssid_path.starts_with("Device."));
            assert!(hier.password_path.starts_with("Device."));
        }
    }
}
