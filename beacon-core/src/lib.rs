//! beacon-core: Shared library for the device telemetry relay
//!
//! This crate provides:
//! - Device record and wire types for `/update` and the live channel
//! - The in-memory state table with snapshot persistence
//! - Shared-token authentication
//! - Configuration and an HTTP client for the relay

pub mod auth;
pub mod client;
pub mod config;
pub mod protocol;
pub mod table;

pub use auth::{AuthError, TokenAuth};
pub use client::RelayClient;
pub use config::Config;
pub use protocol::{DeviceRecord, IngestError, Snapshot, UpdateRequest, UpdateResponse};
pub use table::{StateTable, StoreError};

/// Default HTTP port for beacon-server
pub const DEFAULT_PORT: u16 = 8000;

/// Name of the session cookie carrying the shared token
pub const SESSION_COOKIE: &str = "token";

/// Session cookie lifetime (10 years)
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;
