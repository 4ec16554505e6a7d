//! Device status collection

use serde_json::{Map, Value};
use sysinfo::{Networks, System};

use beacon_core::config::ReporterConfig;
use beacon_core::UpdateRequest;

/// Message kind sent with every report
pub const REPORT_KIND: &str = "device_info";

/// One sample of device status
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub device_id: String,
    /// Sample time (Unix seconds)
    pub time: i64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_online: bool,
    /// Boot time (Unix seconds)
    pub boot_time: u64,
}

impl DeviceStatus {
    /// Sample the local host
    pub fn sample(device_id: &str, config: &ReporterConfig) -> Self {
        let networks = Networks::new_with_refreshed_list();

        Self {
            device_id: device_id.to_string(),
            time: chrono::Utc::now().timestamp(),
            lat: config.latitude,
            lng: config.longitude,
            is_online: has_external_interface(networks.list().keys().map(String::as_str)),
            boot_time: System::boot_time(),
        }
    }

    /// Wrap as an `/update` body
    pub fn into_request(self) -> UpdateRequest {
        let mut data = Map::new();
        data.insert("deviceId".to_string(), Value::from(self.device_id));
        data.insert("time".to_string(), Value::from(self.time));
        data.insert("lat".to_string(), self.lat.map_or(Value::Null, Value::from));
        data.insert("lng".to_string(), self.lng.map_or(Value::Null, Value::from));
        data.insert("isOnline".to_string(), Value::from(self.is_online));
        data.insert("bootTime".to_string(), Value::from(self.boot_time));

        UpdateRequest {
            kind: Some(REPORT_KIND.to_string()),
            data,
        }
    }
}

/// Whether any non-loopback interface exists
fn has_external_interface<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    names
        .into_iter()
        .any(|name| name != "lo" && name != "lo0")
}

/// Device id from config, falling back to the host name
pub fn resolve_device_id(config: &ReporterConfig) -> String {
    config
        .device_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown".to_string())
}
