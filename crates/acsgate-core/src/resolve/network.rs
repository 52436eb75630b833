// ── Network resolver ──
//
// WAN/LAN addresses, per-band SSIDs, management settings, the subscriber
// tag, and PPPoE credential paths. Every resolver degrades to `None` or a
// default path; partial documents are the normal case.

use serde::Serialize;
use url::{Host, Url};

use crate::config::WlanPolicy;
use crate::document::{Document, Scalar};
use crate::resolve::identity::resolve_vendor;
use crate::resolve::wifi::legacy_ssid_path;
use crate::schema::{Band, Scheme, band_map, paths};

const IP_INTERFACE: &str = "Device.IP.Interface";

/// Legacy WAN address fields, in priority order.
pub const LEGACY_WAN_PATHS: [&str; 3] = [
    "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANIPConnection.1.ExternalIPAddress",
    "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.WANIPConnection.1.ExternalIPAddress",
    "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.ExternalIPAddress",
];

pub const LAN_PATHS: [&str; 4] = [
    "InternetGatewayDevice.LANDevice.1.LANHostConfigManagement.IPInterface.1.IPInterfaceIPAddress",
    "InternetGatewayDevice.LANDevice.1.LANHostConfigManagement.IPInterface.1.IPAddress",
    "Device.LAN.IPAddress",
    "Device.IP.Interface.1.IPv4Address.1.IPAddress",
];

pub const CONNECTION_REQUEST_URL_PATHS: [&str; 2] = [
    "Device.ManagementServer.ConnectionRequestURL",
    "InternetGatewayDevice.ManagementServer.ConnectionRequestURL",
];

pub const STUN_ENABLE_PATHS: [&str; 2] = [
    "Device.ManagementServer.STUNEnable",
    "InternetGatewayDevice.ManagementServer.STUNEnable",
];

pub const PERIODIC_INFORM_INTERVAL_PATHS: [&str; 2] = [
    "Device.ManagementServer.PeriodicInformInterval",
    "InternetGatewayDevice.ManagementServer.PeriodicInformInterval",
];

fn non_blank_str<'d>(doc: &'d Document, path: &str) -> Option<&'d str> {
    doc.get(path)
        .and_then(Scalar::as_str)
        .filter(|s| !s.is_empty())
}

fn interface_is_up(status: Option<&Scalar>) -> bool {
    match status {
        Some(Scalar::Text(s)) => matches!(s.as_str(), "Up" | "UP" | "Enabled" | "true"),
        Some(Scalar::Bool(b)) => *b,
        _ => false,
    }
}

// ── Addresses ────────────────────────────────────────────────────────

/// WAN IPv4: first hierarchical IP interface that is up, then the legacy
/// WAN connections, then the host of the connection-request URL.
pub fn resolve_wan_ipv4(doc: &Document) -> Option<String> {
    let from_interfaces = doc.instances(IP_INTERFACE).into_iter().find_map(|i| {
        let status = doc.get(&format!("{IP_INTERFACE}.{i}.Status"));
        if !interface_is_up(status) {
            return None;
        }
        non_blank_str(doc, &format!("{IP_INTERFACE}.{i}.IPv4Address.1.IPAddress"))
    });
    if let Some(addr) = from_interfaces {
        return Some(addr.to_owned());
    }

    if let Some(addr) = LEGACY_WAN_PATHS.iter().find_map(|p| non_blank_str(doc, p)) {
        return Some(addr.to_owned());
    }

    let url = CONNECTION_REQUEST_URL_PATHS
        .iter()
        .find_map(|p| non_blank_str(doc, p))?;
    let url = Url::parse(url).ok()?;
    match url.host()? {
        Host::Domain(name) => Some(name.to_owned()),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

pub fn resolve_lan_ipv4(doc: &Document) -> Option<String> {
    LAN_PATHS
        .iter()
        .find_map(|p| non_blank_str(doc, p))
        .map(ToOwned::to_owned)
}

// ── Wi-Fi names ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SsidPair {
    pub ssid_24: Option<String>,
    pub ssid_5: Option<String>,
}

impl SsidPair {
    pub fn get(&self, band: Band) -> Option<&str> {
        match band {
            Band::TwoFour => self.ssid_24.as_deref(),
            Band::Five => self.ssid_5.as_deref(),
        }
    }
}

/// SSID per band: the hierarchical band map first, then the legacy
/// policy instances in order (1 for 2.4 GHz; 3 then 2 for 5 GHz).
pub fn resolve_ssids(doc: &Document, policy: &WlanPolicy) -> SsidPair {
    let map = band_map(doc);
    let vendor = resolve_vendor(doc);
    let defaults = policy.for_vendor(vendor.as_deref());

    let resolve = |band: Band| {
        map.get(&band)
            .and_then(|b| doc.text(&format!("{}.{}.SSID", paths::WIFI_SSID, b.ssid)))
            .or_else(|| {
                defaults
                    .candidates(band)
                    .iter()
                    .find_map(|i| doc.text(&legacy_ssid_path(i)))
            })
    };

    SsidPair {
        ssid_24: resolve(Band::TwoFour),
        ssid_5: resolve(Band::Five),
    }
}

// ── Management ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Management {
    pub conn_req_url: Option<String>,
    pub stun_enable: bool,
    pub periodic_inform_interval: Option<u64>,
}

pub fn resolve_management(doc: &Document) -> Management {
    Management {
        conn_req_url: doc
            .first_non_blank(CONNECTION_REQUEST_URL_PATHS)
            .map(ToString::to_string),
        stun_enable: doc
            .first_non_blank(STUN_ENABLE_PATHS)
            .and_then(Scalar::as_bool)
            .unwrap_or(false),
        periodic_inform_interval: doc
            .first_non_blank(PERIODIC_INFORM_INTERVAL_PATHS)
            .and_then(Scalar::as_u64),
    }
}

// ── Subscriber tag ───────────────────────────────────────────────────

/// Suffix of the first tag carrying one of `prefixes`, e.g. `sub:4411` →
/// `4411`. A matching tag with an empty suffix yields `None`.
pub fn pick_subscriber_tag(doc: &Document, prefixes: &[String]) -> Option<String> {
    doc.tags().into_iter().find_map(|tag| {
        prefixes
            .iter()
            .find_map(|p| tag.strip_prefix(p.as_str()))
            .map(|suffix| (!suffix.is_empty()).then(|| suffix.to_owned()))
    })?
}

// ── PPPoE ────────────────────────────────────────────────────────────

/// Parameter paths for PPPoE credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PppoeParams {
    pub scheme: Scheme,
    pub username_path: String,
    pub password_path: String,
    pub enable_path: String,
}

impl PppoeParams {
    fn under(scheme: Scheme, base: &str) -> Self {
        Self {
            scheme,
            username_path: format!("{base}.Username"),
            password_path: format!("{base}.Password"),
            enable_path: format!("{base}.Enable"),
        }
    }
}

const PPP_INTERFACE: &str = "Device.PPP.Interface";
const WAN_CONNECTION_DEVICE: &str = "InternetGatewayDevice.WANDevice.1.WANConnectionDevice";

/// PPPoE credential paths: the first hierarchical PPP interface, else the
/// first legacy WAN connection device carrying a PPP connection, else the
/// scheme's first instance.
pub fn resolve_pppoe_params(doc: &Document) -> PppoeParams {
    if let Some(i) = doc.instances(PPP_INTERFACE).first() {
        return PppoeParams::under(Scheme::Hierarchical, &format!("{PPP_INTERFACE}.{i}"));
    }

    let legacy = doc
        .instances(WAN_CONNECTION_DEVICE)
        .into_iter()
        .map(|i| format!("{WAN_CONNECTION_DEVICE}.{i}.WANPPPConnection.1"))
        .find(|base| doc.has_object(base));
    if let Some(base) = legacy {
        return PppoeParams::under(Scheme::Legacy, &base);
    }

    if doc.has_object(paths::HIERARCHICAL_ROOT) && !doc.has_object(paths::LEGACY_ROOT) {
        return PppoeParams::under(Scheme::Hierarchical, &format!("{PPP_INTERFACE}.1"));
    }
    PppoeParams::under(
        Scheme::Legacy,
        &format!("{WAN_CONNECTION_DEVICE}.1.WANPPPConnection.1"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{tr098_gateway, tr181_gateway, v};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn wan_prefers_first_up_interface() {
        assert_eq!(
            resolve_wan_ipv4(&tr181_gateway()).as_deref(),
            Some("192.168.18.1")
        );
    }

    #[test]
    fn wan_skips_blank_legacy_fields() {
        // WCD 1 and 2 IP connections are blank; the PPP one on WCD 1 is
        // missing, so the URL host is used.
        assert_eq!(
            resolve_wan_ipv4(&tr098_gateway()).as_deref(),
            Some("177.10.20.30")
        );
    }

    #[test]
    fn wan_falls_back_to_connection_request_host() {
        let doc = Document::from(json!({ "InternetGatewayDevice": { "ManagementServer": {
            "ConnectionRequestURL": v("http://[2001:db8::1]:7547/cr")
        } } }));
        assert_eq!(resolve_wan_ipv4(&doc).as_deref(), Some("2001:db8::1"));

        let doc = Document::from(json!({ "InternetGatewayDevice": { "ManagementServer": {
            "ConnectionRequestURL": v("not a url")
        } } }));
        assert_eq!(resolve_wan_ipv4(&doc), None);
    }

    #[test]
    fn wan_accepts_boolean_status() {
        let doc = Document::from(json!({ "Device": { "IP": { "Interface": {
            "7": { "Status": v(true), "IPv4Address": { "1": { "IPAddress": v("203.0.113.4") } } }
        } } } }));
        assert_eq!(resolve_wan_ipv4(&doc).as_deref(), Some("203.0.113.4"));
    }

    #[test]
    fn lan_priority_list() {
        assert_eq!(
            resolve_lan_ipv4(&tr098_gateway()).as_deref(),
            Some("192.168.0.1")
        );
        assert_eq!(
            resolve_lan_ipv4(&tr181_gateway()).as_deref(),
            Some("192.168.18.1")
        );
        assert_eq!(resolve_lan_ipv4(&Document::default()), None);
    }

    #[test]
    fn ssids_per_scheme() {
        let policy = WlanPolicy::default();
        assert_eq!(
            resolve_ssids(&tr181_gateway(), &policy),
            SsidPair {
                ssid_24: Some("casa".into()),
                ssid_5: Some("casa-5g".into()),
            }
        );
        assert_eq!(
            resolve_ssids(&tr098_gateway(), &policy),
            SsidPair {
                ssid_24: Some("EX141-2G".into()),
                ssid_5: Some("EX141-5G".into()),
            }
        );
    }

    #[test]
    fn management_fields() {
        let m = resolve_management(&tr098_gateway());
        assert_eq!(m.conn_req_url.as_deref(), Some("http://177.10.20.30:7547/"));
        assert!(m.stun_enable);
        assert_eq!(m.periodic_inform_interval, Some(600));

        let m = resolve_management(&tr181_gateway());
        assert!(!m.stun_enable);
        assert_eq!(m.periodic_inform_interval, Some(300));
    }

    #[test]
    fn subscriber_tag() {
        let prefixes = vec!["sub:".to_string()];
        assert_eq!(
            pick_subscriber_tag(&tr181_gateway(), &prefixes).as_deref(),
            Some("77001")
        );
        // The first matching tag has an empty suffix.
        assert_eq!(pick_subscriber_tag(&tr098_gateway(), &prefixes), None);
        assert_eq!(pick_subscriber_tag(&tr181_gateway(), &[]), None);
    }

    #[test]
    fn pppoe_paths() {
        let hier = resolve_pppoe_params(&tr181_gateway());
        assert_eq!(hier.username_path, "Device.PPP.Interface.2.Username");
        assert_eq!(hier.enable_path, "Device.PPP.Interface.2.Enable");

        let legacy = resolve_pppoe_params(&tr098_gateway());
        assert_eq!(
            legacy.password_path,
            "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.WANPPPConnection.1.Password"
        );

        let empty = resolve_pppoe_params(&Document::default());
        assert_eq!(
            empty.username_path,
            "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Username"
        );
    }
}
