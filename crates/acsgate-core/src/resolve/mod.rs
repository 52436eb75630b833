// ── Document resolvers ──
//
// Pure functions from a device document to typed answers. None of them
// fail: a missing field degrades to `None` or a documented default.

pub mod identity;
pub mod network;
pub mod wifi;

pub use identity::{Identity, resolve_firmware, resolve_identity, resolve_model, resolve_serial, resolve_vendor};
pub use network::{
    Management, PppoeParams, SsidPair, pick_subscriber_tag, resolve_lan_ipv4, resolve_management,
    resolve_pppoe_params, resolve_ssids, resolve_wan_ipv4,
};
pub use wifi::{WifiParams, resolve_wifi_params};
