// ── Typed request structs for Command payloads ──

use std::time::Duration;

use acsgate_api::{SortOrder, TaskOptions};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::schema::Band;

// ── Delivery ───────────────────────────────────────────────────────

/// How a task should reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Ask the controller to contact the device right away.
    pub connection_request: bool,
    /// How long the controller may wait for the device. Only sent with a
    /// connection request.
    pub timeout: Option<Duration>,
}

impl Default for Delivery {
    fn default() -> Self {
        Self {
            connection_request: true,
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl Delivery {
    /// Leave the task queued until the device's next periodic inform.
    pub fn queued() -> Self {
        Self {
            connection_request: false,
            timeout: None,
        }
    }

    pub fn to_task_options(self) -> TaskOptions {
        TaskOptions {
            connection_request: self.connection_request,
            timeout_ms: if self.connection_request {
                self.timeout
                    .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
            } else {
                None
            },
        }
    }
}

// ── Wi-Fi ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WifiChange {
    pub band: Band,
    pub ssid: String,
    pub password: SecretString,
    /// Explicit SSID path; only used together with `password_param`.
    pub ssid_param: Option<String>,
    /// Explicit password path; only used together with `ssid_param`.
    pub password_param: Option<String>,
}

// ── PPPoE ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PppoeChange {
    pub username: String,
    pub password: SecretString,
    /// Written as `xsd:boolean` when set.
    pub enable: Option<bool>,
    pub username_param: Option<String>,
    pub password_param: Option<String>,
    pub enable_param: Option<String>,
}

// ── Device listing ─────────────────────────────────────────────────

/// Sort key for device listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ListSort {
    #[default]
    #[strum(to_string = "last_inform", serialize = "_lastInform")]
    LastInform,
    ProductClass,
    SoftwareVersion,
}

/// Maximum page size accepted by [`DeviceListQuery`].
pub const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Clamped to `1..=500`.
    pub page_size: u32,
    /// Case-insensitive regex over id, product class, and firmware.
    pub search: Option<String>,
    pub tag: Option<String>,
    pub product_class: Option<String>,
    /// Liveness window; the configured online window when `None`.
    pub online_within_secs: Option<u64>,
    pub only_online: bool,
    pub sort_by: ListSort,
    pub order: SortOrder,
}

impl Default for DeviceListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
            search: None,
            tag: None,
            product_class: None,
            online_within_secs: None,
            only_online: false,
            sort_by: ListSort::default(),
            order: SortOrder::Descending,
        }
    }
}

impl DeviceListQuery {
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> u32 {
        (self.effective_page() - 1).saturating_mul(self.effective_page_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_only_travels_with_connection_request() {
        let opts = Delivery::default().to_task_options();
        assert!(opts.connection_request);
        assert_eq!(opts.timeout_ms, Some(10_000));

        let queued = Delivery {
            connection_request: false,
            timeout: Some(Duration::from_secs(10)),
        };
        assert_eq!(queued.to_task_options().timeout_ms, None);
    }

    #[test]
    fn page_size_is_clamped() {
        let q = DeviceListQuery {
            page: 0,
            page_size: 9_999,
            ..DeviceListQuery::default()
        };
        assert_eq!(q.effective_page(), 1);
        assert_eq!(q.effective_page_size(), MAX_PAGE_SIZE);
        assert_eq!(q.skip(), 0);

        let q = DeviceListQuery {
            page: 3,
            page_size: 0,
            ..DeviceListQuery::default()
        };
        assert_eq!(q.effective_page_size(), 1);
        assert_eq!(q.skip(), 2);
    }

    #[test]
    fn list_sort_accepts_controller_field_name() {
        assert_eq!("_lastInform".parse::<ListSort>().ok(), Some(ListSort::LastInform));
        assert_eq!("product_class".parse::<ListSort>().ok(), Some(ListSort::ProductClass));
    }
}
