// ── Identity resolver ──
//
// Vendor, model, firmware, and serial number. Each field is an ordered
// list of candidate paths: hierarchical first, legacy second, then the
// controller's own `_deviceId` block where it carries the field.

use serde::Serialize;

use crate::document::Document;

pub const VENDOR_PATHS: [&str; 2] = [
    "Device.DeviceInfo.Manufacturer",
    "InternetGatewayDevice.DeviceInfo.Manufacturer",
];

/// Product class first, model name as the fallback.
pub const MODEL_PATHS: [&str; 4] = [
    "Device.DeviceInfo.ProductClass",
    "InternetGatewayDevice.DeviceInfo.ProductClass",
    "Device.DeviceInfo.ModelName",
    "InternetGatewayDevice.DeviceInfo.ModelName",
];

pub const FIRMWARE_PATHS: [&str; 2] = [
    "Device.DeviceInfo.SoftwareVersion",
    "InternetGatewayDevice.DeviceInfo.SoftwareVersion",
];

pub const SERIAL_PATHS: [&str; 2] = [
    "Device.DeviceInfo.SerialNumber",
    "InternetGatewayDevice.DeviceInfo.SerialNumber",
];

/// Device identity fields; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub serial: Option<String>,
}

fn first_text(doc: &Document, paths: &[&str]) -> Option<String> {
    doc.first_non_blank(paths.iter().copied())
        .map(ToString::to_string)
}

pub fn resolve_vendor(doc: &Document) -> Option<String> {
    first_text(doc, &VENDOR_PATHS).or_else(|| doc.device_identity().manufacturer)
}

pub fn resolve_model(doc: &Document) -> Option<String> {
    first_text(doc, &MODEL_PATHS).or_else(|| doc.device_identity().product_class)
}

pub fn resolve_firmware(doc: &Document) -> Option<String> {
    first_text(doc, &FIRMWARE_PATHS)
}

pub fn resolve_serial(doc: &Document) -> Option<String> {
    first_text(doc, &SERIAL_PATHS).or_else(|| doc.device_identity().serial_number)
}

pub fn resolve_identity(doc: &Document) -> Identity {
    Identity {
        vendor: resolve_vendor(doc),
        model: resolve_model(doc),
        firmware: resolve_firmware(doc),
        serial: resolve_serial(doc),
    }
}
