//! In-memory device state table
//!
//! One record per device id; every ingest replaces the whole record.
//! The table is persisted as a single JSON object `{ deviceId: record }`,
//! read once at startup and overwritten once at shutdown.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{DeviceRecord, Snapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Latest record per device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTable {
    devices: BTreeMap<String, DeviceRecord>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for its device id, returning the previous one
    pub fn replace(&mut self, record: DeviceRecord) -> Option<DeviceRecord> {
        self.devices.insert(record.device_id.clone(), record)
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.devices.get(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// All records in table order
    pub fn snapshot(&self) -> Snapshot {
        self.devices.values().cloned().collect()
    }

    /// Load a persisted table; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let table: StateTable = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} device(s) from {}", table.len(), path.display());
        Ok(table)
    }

    /// Overwrite the state file with the full table
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved {} device(s) to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value, ts: &str) -> DeviceRecord {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        DeviceRecord::from_report(map, ts.to_string()).unwrap()
    }

    #[test]
    fn test_replace_never_merges() {
        let mut table = StateTable::new();

        table.replace(record(json!({"deviceId": "A1", "lat": 1.0, "battery": 80}), "t1"));
        let previous = table.replace(record(json!({"deviceId": "A1", "lng": 2.0}), "t2"));

        assert!(previous.is_some());
        assert_eq!(table.len(), 1);

        let current = table.get("A1").unwrap();
        assert_eq!(current.field("lng"), Some(&json!(2.0)));
        assert!(current.field("lat").is_none());
        assert!(current.field("battery").is_none());
        assert_eq!(current.last_update, "t2");
    }

    #[test]
    fn test_snapshot_lists_all_devices() {
        let mut table = StateTable::new();
        assert!(table.snapshot().is_empty());

        table.replace(record(json!({"deviceId": "B2"}), "t1"));
        table.replace(record(json!({"deviceId": "A1"}), "t1"));

        let ids: Vec<_> = table.snapshot().into_iter().map(|r| r.device_id).collect();
        assert_eq!(ids, vec!["A1", "B2"]);
    }

    #[test]
    fn test_persisted_format_is_keyed_by_device() {
        let mut table = StateTable::new();
        table.replace(record(json!({"deviceId": "A1", "isOnline": true}), "t1"));

        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(
            value,
            json!({"A1": {"deviceId": "A1", "isOnline": true, "lastUpdate": "t1"}})
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("devices.json");

        let mut table = StateTable::new();
        table.replace(record(
            json!({"deviceId": "A1", "lat": 31.5, "lng": 121.25, "isOnline": true, "bootTime": 1706000000}),
            "2024-01-01 00:00:00",
        ));
        table.replace(record(json!({"deviceId": "B2", "extra": {"nested": [1, 2, 3]}}), "t2"));
        table.save(&path).unwrap();

        let reloaded = StateTable::load(&path).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = StateTable::load(&dir.path().join("absent.json")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(StateTable::load(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");

        let mut table = StateTable::new();
        table.replace(record(json!({"deviceId": "A1"}), "t1"));
        table.save(&path).unwrap();

        StateTable::new().save(&path).unwrap();
        assert!(StateTable::load(&path).unwrap().is_empty());
    }
}
