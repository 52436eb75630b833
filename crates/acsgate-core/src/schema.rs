// ── Schema detection ──
//
// Devices report either the hierarchical data model (`Device.`) or the
// legacy flat one (`InternetGatewayDevice.`). Only the hierarchical model
// has first-class Radio/SSID/AccessPoint objects that reference each other;
// the band map below follows those references.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::trace;

use crate::document::{Document, Scalar};

/// Well-known parameter paths.
pub mod paths {
    pub const HIERARCHICAL_ROOT: &str = "Device";
    pub const LEGACY_ROOT: &str = "InternetGatewayDevice";

    pub const WIFI: &str = "Device.WiFi";
    pub const WIFI_RADIO: &str = "Device.WiFi.Radio";
    pub const WIFI_SSID: &str = "Device.WiFi.SSID";
    pub const WIFI_ACCESS_POINT: &str = "Device.WiFi.AccessPoint";

    pub const WLAN_CONFIGURATION: &str = "InternetGatewayDevice.LANDevice.1.WLANConfiguration";
}

static RADIO_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Device\.WiFi\.Radio\.(\d+)").ok());
static SSID_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Device\.WiFi\.SSID\.(\d+)").ok());

// ── Band ─────────────────────────────────────────────────────────────

/// A physical radio band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Band {
    #[strum(to_string = "2.4GHz", serialize = "2.4", serialize = "2g", serialize = "24")]
    #[serde(rename = "2.4GHz")]
    TwoFour,
    #[strum(to_string = "5GHz", serialize = "5", serialize = "5g")]
    #[serde(rename = "5GHz")]
    Five,
}

impl Band {
    pub const ALL: [Band; 2] = [Band::TwoFour, Band::Five];

    /// Parse a radio's `OperatingFrequencyBand` value. Only the two
    /// canonical spellings count; 6 GHz and friends are ignored.
    pub fn from_operating_frequency(value: &str) -> Option<Self> {
        match value.trim() {
            "2.4GHz" => Some(Self::TwoFour),
            "5GHz" => Some(Self::Five),
            _ => None,
        }
    }
}

// ── Scheme ───────────────────────────────────────────────────────────

/// Parameter-naming scheme of a device document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scheme {
    /// `Device.` (TR-181).
    Hierarchical,
    /// `InternetGatewayDevice.` (TR-098).
    Legacy,
}

impl Scheme {
    /// Which root is populated. The hierarchical scheme wins when both are.
    pub fn detect(doc: &Document) -> Option<Self> {
        if doc.has_object(paths::HIERARCHICAL_ROOT) {
            Some(Self::Hierarchical)
        } else if doc.has_object(paths::LEGACY_ROOT) {
            Some(Self::Legacy)
        } else {
            None
        }
    }

    pub fn root(self) -> &'static str {
        match self {
            Self::Hierarchical => paths::HIERARCHICAL_ROOT,
            Self::Legacy => paths::LEGACY_ROOT,
        }
    }

    /// Path of the firmware version under this scheme.
    pub fn software_version_path(self) -> String {
        format!("{}.DeviceInfo.SoftwareVersion", self.root())
    }
}

// ── Band map ─────────────────────────────────────────────────────────

/// The SSID, access point, and radio instances serving one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandBinding {
    pub ssid: String,
    pub access_point: String,
    pub radio: String,
}

fn capture_instance(re: Option<&Regex>, text: &str) -> Option<String> {
    re?.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn text_at<'d>(doc: &'d Document, path: &str) -> Option<&'d str> {
    doc.get(path).and_then(Scalar::as_str)
}

/// Map each band to the hierarchical instances that serve it.
///
/// Follows AccessPoint → SSID (`SSIDReference`) → Radio (`LowerLayers`)
/// → `OperatingFrequencyBand`. Entries with a missing object or an
/// unparseable reference are dropped. When several access points land
/// on the same band, the last one in document order wins.
pub fn band_map(doc: &Document) -> HashMap<Band, BandBinding> {
    let mut map = HashMap::new();
    if !doc.has_object(paths::WIFI) {
        return map;
    }

    let radio_band: HashMap<&str, Band> = doc
        .instances(paths::WIFI_RADIO)
        .into_iter()
        .filter_map(|r| {
            let path = format!("{}.{r}.OperatingFrequencyBand", paths::WIFI_RADIO);
            text_at(doc, &path)
                .and_then(Band::from_operating_frequency)
                .map(|band| (r, band))
        })
        .collect();

    let ssid_radio: HashMap<&str, String> = doc
        .instances(paths::WIFI_SSID)
        .into_iter()
        .filter_map(|i| {
            let path = format!("{}.{i}.LowerLayers", paths::WIFI_SSID);
            text_at(doc, &path)
                .and_then(|ll| capture_instance(RADIO_REF.as_ref(), ll))
                .map(|radio| (i, radio))
        })
        .collect();

    for ap in doc.instances(paths::WIFI_ACCESS_POINT) {
        let path = format!("{}.{ap}.SSIDReference", paths::WIFI_ACCESS_POINT);
        let Some(ssid) = text_at(doc, &path).and_then(|r| capture_instance(SSID_REF.as_ref(), r)) else {
            continue;
        };
        let Some(radio) = ssid_radio.get(ssid.as_str()) else {
            continue;
        };
        let Some(band) = radio_band.get(radio.as_str()) else {
            continue;
        };
        trace!(%band, ap, ssid = %ssid, radio = %radio, "band binding");
        map.insert(
            *band,
            BandBinding {
                ssid,
                access_point: ap.to_owned(),
                radio: radio.clone(),
            },
        );
    }

    map
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(s: &str) -> serde_json::Value {
        json!({ "_value": s })
    }

    fn dual_band_tr181() -> Document {
        Document::from(json!({
            "Device": { "WiFi": {
                "Radio": {
                    "1": { "OperatingFrequencyBand": v("2.4GHz") },
                    "2": { "OperatingFrequencyBand": v("5GHz") }
                },
                "SSID": {
                    "1": { "LowerLayers": v("Device.WiFi.Radio.1."), "SSID": v("home") },
                    "2": { "LowerLayers": v("Device.WiFi.Radio.2."), "SSID": v("home-5g") }
                },
                "AccessPoint": {
                    "1": { "SSIDReference": v("Device.WiFi.SSID.1.") },
                    "4": { "SSIDReference": v("Device.WiFi.SSID.2.") }
                }
            } }
        }))
    }

    #[test]
    fn follows_cross_references() {
        let map = band_map(&dual_band_tr181());
        assert_eq!(
            map.get(&Band::Five),
            Some(&BandBinding {
                ssid: "2".into(),
                access_point: "4".into(),
                radio: "2".into()
            })
        );
        assert_eq!(map.get(&Band::TwoFour).unwrap().access_point, "1");
    }

    #[test]
    fn broken_references_are_dropped() {
        let doc = Document::from(json!({
            "Device": { "WiFi": {
                "Radio": { "1": { "OperatingFrequencyBand": v("6GHz") },
                           "2": { "OperatingFrequencyBand": v("5GHz") } },
                "SSID": {
                    "1": { "LowerLayers": v("Device.WiFi.Radio.1.") },
                    "2": { "LowerLayers": v("garbage") },
                    "3": { "LowerLayers": v("Device.WiFi.Radio.2.") }
                },
                "AccessPoint": {
                    "1": { "SSIDReference": v("Device.WiFi.SSID.1.") },
                    "2": { "SSIDReference": v("Device.WiFi.SSID.2.") },
                    "3": { "SSIDReference": { "_value": { "odd": 1 } } },
                    "5": { "SSIDReference": v("Device.WiFi.SSID.3.") }
                }
            } }
        }));
        let map = band_map(&doc);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Band::Five].access_point, "5");
    }

    #[test]
    fn last_access_point_wins_per_band() {
        let doc = Document::from(json!({
            "Device": { "WiFi": {
                "Radio": { "1": { "OperatingFrequencyBand": v("2.4GHz") } },
                "SSID": { "1": { "LowerLayers": v("Device.WiFi.Radio.1.") },
                          "3": { "LowerLayers": v("Device.WiFi.Radio.1.") } },
                "AccessPoint": {
                    "1": { "SSIDReference": v("Device.WiFi.SSID.1.") },
                    "2": { "SSIDReference": v("Device.WiFi.SSID.3.") }
                }
            } }
        }));
        assert_eq!(band_map(&doc)[&Band::TwoFour].ssid, "3");
    }

    #[test]
    fn legacy_document_has_no_band_map() {
        let doc = Document::from(json!({
            "InternetGatewayDevice": { "LANDevice": { "1": { "WLANConfiguration": {} } } }
        }));
        assert!(band_map(&doc).is_empty());
        assert_eq!(Scheme::detect(&doc), Some(Scheme::Legacy));
    }

    #[test]
    fn scheme_detection_prefers_hierarchical() {
        let both = Document::from(json!({ "Device": {}, "InternetGatewayDevice": {} }));
        assert_eq!(Scheme::detect(&both), Some(Scheme::Hierarchical));
        assert_eq!(Scheme::detect(&Document::default()), None);
        assert_eq!(
            Scheme::Legacy.software_version_path(),
            "InternetGatewayDevice.DeviceInfo.SoftwareVersion"
        );
    }

    #[test]
    fn band_parses_common_spellings() {
        assert_eq!("5GHz".parse::<Band>().unwrap(), Band::Five);
        assert_eq!("5g".parse::<Band>().unwrap(), Band::Five);
        assert_eq!("2.4ghz".parse::<Band>().unwrap(), Band::TwoFour);
        assert_eq!(Band::TwoFour.to_string(), "2.4GHz");
        assert!("6GHz".parse::<Band>().is_err());
    }
}
