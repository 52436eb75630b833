// Sample device documents shared by unit tests.

use serde_json::{Value, json};

use crate::document::Document;

pub(crate) fn v(value: impl Into<Value>) -> Value {
    json!({ "_value": value.into() })
}

/// Hierarchical gateway: AP 1 → SSID 1 → radio 1 (2.4 GHz),
/// AP 4 → SSID 2 → radio 2 (5 GHz).
pub(crate) fn tr181_gateway() -> Document {
    Document::from(json!({
        "_id": "00259E-EG8145V5-48575443A1B2C3D4",
        "_lastInform": "2024-01-01T00:00:00Z",
        "_tags": ["vip", "sub:77001"],
        "_deviceId": {
            "_Manufacturer": "Huawei",
            "_OUI": "00259E",
            "_ProductClass": "EG8145V5",
            "_SerialNumber": "48575443A1B2C3D4"
        },
        "Device": {
            "DeviceInfo": {
                "Manufacturer": v("Huawei Technologies Co., Ltd"),
                "ProductClass": v("EG8145V5"),
                "ModelName": v("EchoLife EG8145V5"),
                "SoftwareVersion": v("V5R020C10S115"),
                "SerialNumber": v("48575443A1B2C3D4")
            },
            "ManagementServer": {
                "ConnectionRequestURL": v("http://100.64.12.9:7547/tr069"),
                "STUNEnable": v(false),
                "PeriodicInformInterval": v(300)
            },
            "IP": { "Interface": {
                "1": { "Status": v("Up"), "IPv4Address": { "1": { "IPAddress": v("192.168.18.1") } } },
                "2": { "Status": v("Down"), "IPv4Address": { "1": { "IPAddress": v("10.0.0.9") } } },
                "3": { "Status": v("Up"), "IPv4Address": { "1": { "IPAddress": v("100.64.12.9") } } }
            } },
            "PPP": { "Interface": {
                "2": { "Username": v("cliente@isp"), "Enable": v(true) }
            } },
            "WiFi": {
                "Radio": {
                    "1": { "OperatingFrequencyBand": v("2.4GHz") },
                    "2": { "OperatingFrequencyBand": v("5GHz") }
                },
                "SSID": {
                    "1": { "LowerLayers": v("Device.WiFi.Radio.1."), "SSID": v("casa") },
                    "2": { "LowerLayers": v("Device.WiFi.Radio.2."), "SSID": v("casa-5g") }
                },
                "AccessPoint": {
                    "1": {
                        "SSIDReference": v("Device.WiFi.SSID.1."),
                        "Security": { "KeyPassphrase": v(""), "PreSharedKey": v("abcd1234") }
                    },
                    "4": {
                        "SSIDReference": v("Device.WiFi.SSID.2."),
                        "Security": { "KeyPassphrase": v("segredo5") }
                    }
                }
            }
        }
    }))
}

/// Legacy TP-Link style gateway: WLAN 1 is 2.4 GHz, WLAN 3 is 5 GHz, no
/// band hints or standards reported.
pub(crate) fn tr098_gateway() -> Document {
    Document::from(json!({
        "_id": "202BC1-EX141-22357Q",
        "_lastInform": "2024-01-01T00:05:00.000Z",
        "_tags": ["sub:", "sub:4411"],
        "_deviceId": {
            "_Manufacturer": "TP-Link",
            "_OUI": "202BC1",
            "_ProductClass": "EX141",
            "_SerialNumber": "22357Q"
        },
        "InternetGatewayDevice": {
            "DeviceInfo": {
                "Manufacturer": v("TP-Link"),
                "ProductClass": v("EX141"),
                "SoftwareVersion": v("1.1.0 Build 230511"),
                "SerialNumber": v("22357Q")
            },
            "ManagementServer": {
                "ConnectionRequestURL": v("http://177.10.20.30:7547/"),
                "STUNEnable": v("true"),
                "PeriodicInformInterval": v("600")
            },
            "WANDevice": { "1": { "WANConnectionDevice": {
                "1": { "WANIPConnection": { "1": { "ExternalIPAddress": v("") } } },
                "2": {
                    "WANIPConnection": { "1": { "ExternalIPAddress": v("") } },
                    "WANPPPConnection": { "1": { "ExternalIPAddress": v("177.10.20.30"), "Username": v("pppuser") } }
                }
            } } },
            "LANDevice": { "1": {
                "LANHostConfigManagement": { "IPInterface": { "1": { "IPInterfaceIPAddress": v("192.168.0.1") } } },
                "WLANConfiguration": {
                    "1": { "SSID": v("EX141-2G"), "PreSharedKey": { "1": { "PreSharedKey": v("x"), "KeyPassphrase": v("pass24") } } },
                    "2": { "SSID": v(Value::Null) },
                    "3": { "SSID": v("EX141-5G"), "PreSharedKey": { "1": { "PreSharedKey": v("y") } } }
                }
            } }
        }
    }))
}
