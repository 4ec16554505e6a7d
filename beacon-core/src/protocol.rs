//! Wire types for beacon
//!
//! All payloads are JSON:
//! - Devices POST `{"data": {"deviceId": ..., ...}}` to `/update`
//! - The relay answers `{"status": "ok"}` or `{"status": "error", "message": ...}`
//! - Live channels receive the full snapshot as a JSON list of device records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Server-side timestamp format for `lastUpdate`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Missing deviceId")]
    MissingDeviceId,
}

/// Last known status of one device
///
/// Apart from `deviceId` and the server-assigned `lastUpdate`, fields are
/// whatever the device reported; their shape is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "deviceId")]
    pub device_id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,

    #[serde(rename = "lastUpdate")]
    pub last_update: String,
}

impl DeviceRecord {
    /// Build a record from a reported `data` object
    pub fn from_report(mut data: Map<String, Value>, last_update: String) -> Result<Self, IngestError> {
        let device_id = match data.remove("deviceId") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(IngestError::MissingDeviceId),
        };

        // lastUpdate belongs to the server
        data.remove("lastUpdate");

        Ok(Self {
            device_id,
            fields: data,
            last_update,
        })
    }

    /// Look up a reported field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Full state table as sent over a live channel
pub type Snapshot = Vec<DeviceRecord>;

/// Body of `POST /update`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Message kind, e.g. `device_info`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub data: Map<String, Value>,
}

impl UpdateRequest {
    /// Read an update envelope from any JSON value
    ///
    /// A `type` that is not a string is ignored. A missing or non-object
    /// `data` reads as `{}`, which ingest rejects for lacking a device id.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut body) = value else {
            return Self::default();
        };

        let kind = match body.remove("type") {
            Some(Value::String(kind)) => Some(kind),
            _ => None,
        };
        let data = match body.remove("data") {
            Some(Value::Object(data)) => data,
            _ => Map::new(),
        };

        Self { kind, data }
    }
}

/// Result of `POST /update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateResponse {
    Ok,
    Error { message: String },
}

impl From<IngestError> for UpdateResponse {
    fn from(err: IngestError) -> Self {
        UpdateResponse::Error {
            message: err.to_string(),
        }
    }
}

/// Current local time in the `lastUpdate` format
pub fn server_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
