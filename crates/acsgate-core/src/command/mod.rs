// ── Command API ──
//
// All write operations flow through a unified `Command` enum. Each
// variant becomes one controller task (Wi-Fi plus reboot becomes two,
// submitted in order). Nothing is ever retried.

pub mod requests;

use acsgate_api::TaskAck;
use serde::Serialize;

pub use requests::{Delivery, DeviceListQuery, ListSort, PppoeChange, WifiChange};

/// All possible write operations against a device.
#[derive(Debug, Clone)]
pub enum Command {
    ChangeWifi {
        device_id: String,
        change: WifiChange,
    },
    ChangeWifiAndReboot {
        device_id: String,
        change: WifiChange,
    },
    ChangePppoe {
        device_id: String,
        change: PppoeChange,
    },
    Reboot {
        device_id: String,
    },
    FactoryReset {
        device_id: String,
    },
    GetParameterValues {
        device_id: String,
        names: Vec<String>,
    },
    RefreshObject {
        device_id: String,
        object: String,
    },
    /// Nudge the device into a session by reading its firmware version.
    ConnectionRequest {
        device_id: String,
    },
}

impl Command {
    pub fn device_id(&self) -> &str {
        match self {
            Self::ChangeWifi { device_id, .. }
            | Self::ChangeWifiAndReboot { device_id, .. }
            | Self::ChangePppoe { device_id, .. }
            | Self::Reboot { device_id }
            | Self::FactoryReset { device_id }
            | Self::GetParameterValues { device_id, .. }
            | Self::RefreshObject { device_id, .. }
            | Self::ConnectionRequest { device_id } => device_id,
        }
    }
}

/// A submitted task plus the parameter paths it touched.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: TaskAck,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// Result of a command execution.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandResult {
    Task(TaskOutcome),
    WifiAndReboot {
        wifi: TaskOutcome,
        reboot: TaskOutcome,
    },
}

impl CommandResult {
    /// Every acknowledgement carried by this result, in submission order.
    pub fn acks(&self) -> Vec<&TaskAck> {
        match self {
            Self::Task(outcome) => vec![&outcome.task],
            Self::WifiAndReboot { wifi, reboot } => vec![&wifi.task, &reboot.task],
        }
    }
}
