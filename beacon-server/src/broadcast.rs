//! Snapshot fan-out to live channels
//!
//! Delivery is best-effort: every push result is inspected and then
//! dropped. A failed push never aborts the fan-out, never deregisters the
//! channel and never reaches the request that triggered the broadcast.

use beacon_core::DeviceRecord;

use crate::registry::{ConnectionRegistry, LiveChannel, PushError};

/// Outcome of one fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Encode a snapshot as the live-channel text frame
pub fn encode_snapshot(records: &[DeviceRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

/// Push an encoded snapshot to a single channel
pub fn push_snapshot(channel: &LiveChannel, snapshot: &str) -> Result<(), PushError> {
    channel.push(snapshot.to_string())
}

/// Push an encoded snapshot to every registered channel
pub fn broadcast(registry: &ConnectionRegistry, snapshot: &str) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for channel in registry.iter() {
        match push_snapshot(channel, snapshot) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::debug!("Dropped snapshot: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}
