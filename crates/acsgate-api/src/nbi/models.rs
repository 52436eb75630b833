// NBI wire types
//
// Task bodies posted to `/devices/{id}/tasks` and the acknowledgement the
// controller sends back. Device documents are returned to callers as raw
// `serde_json::Value` because their shape varies per vendor and data model.

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

// ── Parameter values ─────────────────────────────────────────────────

/// XML-schema type tag attached to every value in a `setParameterValues` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
pub enum XsdType {
    #[strum(serialize = "xsd:string")]
    String,
    #[strum(serialize = "xsd:boolean")]
    Boolean,
    #[strum(serialize = "xsd:int")]
    Int,
    #[strum(serialize = "xsd:unsignedInt")]
    UnsignedInt,
    #[strum(serialize = "xsd:dateTime")]
    DateTime,
}

/// One `[path, value, type]` triple of a `setParameterValues` task.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub path: String,
    pub value: Value,
    pub xsd_type: XsdType,
}

impl ParameterValue {
    pub fn string(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: Value::String(value.into()),
            xsd_type: XsdType::String,
        }
    }

    pub fn boolean(path: impl Into<String>, value: bool) -> Self {
        Self {
            path: path.into(),
            value: Value::Bool(value),
            xsd_type: XsdType::Boolean,
        }
    }

    pub fn unsigned(path: impl Into<String>, value: u64) -> Self {
        Self {
            path: path.into(),
            value: Value::from(value),
            xsd_type: XsdType::UnsignedInt,
        }
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.path)?;
        tup.serialize_element(&self.value)?;
        tup.serialize_element(self.xsd_type.as_ref())?;
        tup.end()
    }
}

// ── Tasks ────────────────────────────────────────────────────────────

/// A one-shot instruction for the controller to carry out against a device.
///
/// Serializes to the controller's native task body, e.g.
/// `{"name": "setParameterValues", "parameterValues": [[path, value, type]]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Task {
    #[serde(rename_all = "camelCase")]
    SetParameterValues {
        parameter_values: Vec<ParameterValue>,
    },
    #[serde(rename_all = "camelCase")]
    GetParameterValues { parameter_names: Vec<String> },
    Reboot,
    FactoryReset,
    #[serde(rename_all = "camelCase")]
    RefreshObject { object_name: String },
}

impl Task {
    /// The controller-side task name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetParameterValues { .. } => "setParameterValues",
            Self::GetParameterValues { .. } => "getParameterValues",
            Self::Reboot => "reboot",
            Self::FactoryReset => "factoryReset",
            Self::RefreshObject { .. } => "refreshObject",
        }
    }
}

/// How the controller should deliver a submitted task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Ask the controller to contact the device now instead of waiting
    /// for its next periodic inform.
    pub connection_request: bool,
    /// How long the controller may wait for the device, in milliseconds.
    /// Only sent together with a connection request.
    pub timeout_ms: Option<u64>,
}

/// Whether the controller finished the task inline or queued it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// HTTP 200: the device was reached and the task ran.
    Completed,
    /// HTTP 202: the task is pending until the device next checks in.
    #[default]
    Queued,
}

/// The controller's acknowledgement of a submitted task.
///
/// Never carries the device-side result; that lands in the device document
/// and has to be read back with a later fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAck {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_deserializing)]
    pub status: TaskStatus,
    /// Catch-all for controller fields we do not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Result of a count query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    pub value: u64,
    /// `false` when the count came from a capped fetch that hit the cap.
    pub exact: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn set_parameter_values_wire_shape() {
        let task = Task::SetParameterValues {
            parameter_values: vec![
                ParameterValue::string("Device.WiFi.SSID.1.SSID", "home"),
                ParameterValue::boolean("Device.PPP.Interface.1.Enable", true),
            ],
        };
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({
                "name": "setParameterValues",
                "parameterValues": [
                    ["Device.WiFi.SSID.1.SSID", "home", "xsd:string"],
                    ["Device.PPP.Interface.1.Enable", true, "xsd:boolean"],
                ]
            })
        );
    }

    #[test]
    fn unit_tasks_carry_only_a_name() {
        assert_eq!(
            serde_json::to_value(Task::FactoryReset).unwrap(),
            json!({ "name": "factoryReset" })
        );
        assert_eq!(
            serde_json::to_value(Task::RefreshObject {
                object_name: "Device.WiFi.".into()
            })
            .unwrap(),
            json!({ "name": "refreshObject", "objectName": "Device.WiFi." })
        );
    }

    #[test]
    fn ack_keeps_unknown_fields() {
        let ack: TaskAck = serde_json::from_value(json!({
            "_id": "65a0",
            "name": "reboot",
            "device": "202BC1-BM632w-000100",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "fault": null
        }))
        .unwrap();
        assert_eq!(ack.id.as_deref(), Some("65a0"));
        assert_eq!(ack.status, TaskStatus::Queued);
        assert!(ack.extra.contains_key("fault"));
    }
}
