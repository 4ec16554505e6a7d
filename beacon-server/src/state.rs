//! Shared server state

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, RwLock};

use beacon_core::config::ServerConfig;
use beacon_core::protocol::server_timestamp;
use beacon_core::{DeviceRecord, StateTable, StoreError, TokenAuth, UpdateResponse};

use crate::broadcast::{self, BroadcastReport};
use crate::registry::{ChannelId, ConnectionRegistry};

pub type SharedState = Arc<RwLock<AppState>>;

/// Shared application state
///
/// Handlers hold the write lock across each read-modify-write sequence:
/// replace-and-broadcast on ingest, register-and-snapshot on subscribe,
/// and unregister on disconnect.
pub struct AppState {
    /// Shared-token authenticator
    pub auth: TokenAuth,

    /// Latest record per device
    pub table: StateTable,

    /// Open live channels
    pub registry: ConnectionRegistry,

    /// Where the table is flushed on teardown
    state_file: Option<PathBuf>,
}

impl AppState {
    pub fn new(auth: TokenAuth, table: StateTable, state_file: Option<PathBuf>) -> Self {
        Self {
            auth,
            table,
            registry: ConnectionRegistry::new(),
            state_file,
        }
    }

    /// Build state from config, loading any persisted snapshot
    pub fn init(config: &ServerConfig) -> Self {
        let auth = TokenAuth::new(&config.username, &config.password);

        let table = StateTable::load(&config.state_file).unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to load {}: {}, starting empty",
                config.state_file.display(),
                e
            );
            StateTable::new()
        });
        tracing::info!("Loaded {} device(s)", table.len());

        Self::new(auth, table, Some(config.state_file.clone()))
    }

    /// Flush the table to the state file
    pub fn teardown(&self) -> Result<(), StoreError> {
        match self.state_file {
            Some(ref path) => {
                self.table.save(path)?;
                tracing::info!("Flushed {} device(s) to {}", self.table.len(), path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Apply one device report and fan the new table out
    pub fn ingest(&mut self, data: Map<String, Value>) -> UpdateResponse {
        let record = match DeviceRecord::from_report(data, server_timestamp()) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Rejected update: {}", e);
                return e.into();
            }
        };

        tracing::debug!("Update from {}", record.device_id);
        self.table.replace(record);

        let report = self.broadcast();
        tracing::trace!(
            "Snapshot delivered to {} channel(s), {} failed",
            report.delivered,
            report.failed
        );

        UpdateResponse::Ok
    }

    /// Push the current table to every registered channel
    pub fn broadcast(&self) -> BroadcastReport {
        match broadcast::encode_snapshot(&self.table.snapshot()) {
            Ok(snapshot) => broadcast::broadcast(&self.registry, &snapshot),
            Err(e) => {
                tracing::error!("Failed to encode snapshot: {}", e);
                BroadcastReport::default()
            }
        }
    }

    /// Register a live channel and queue its connect-time snapshot
    pub fn subscribe(&mut self) -> (ChannelId, mpsc::UnboundedReceiver<String>) {
        let (id, receiver) = self.registry.register();

        let snapshot = match broadcast::encode_snapshot(&self.table.snapshot()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Failed to encode snapshot: {}", e);
                return (id, receiver);
            }
        };

        if let Some(channel) = self.registry.get(&id) {
            if let Err(e) = broadcast::push_snapshot(channel, &snapshot) {
                tracing::debug!("Initial snapshot dropped: {}", e);
            }
        }

        (id, receiver)
    }

    /// Deregister a live channel
    pub fn unsubscribe(&mut self, id: &ChannelId) {
        if self.registry.unregister(id) {
            tracing::debug!("{} live channel(s) remaining", self.registry.len());
        }
    }
}
