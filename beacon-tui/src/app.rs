//! Application state and logic

use tokio::sync::mpsc;

use beacon_core::{Config, DeviceRecord, Snapshot};

use crate::live::LiveEvent;

/// Application result for main loop
pub enum AppResult {
    Continue,
    Quit,
}

/// Live channel state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Live,
    Disconnected(String),
}

/// Main application struct
pub struct App {
    /// Configuration
    pub config: Config,

    /// Latest snapshot
    pub devices: Vec<DeviceRecord>,

    /// Index of the highlighted device
    pub cursor: usize,

    pub connection: ConnectionState,

    /// Snapshots received since start
    pub snapshots: u64,

    events: mpsc::UnboundedReceiver<LiveEvent>,
}

impl App {
    pub fn new(config: Config, events: mpsc::UnboundedReceiver<LiveEvent>) -> Self {
        Self {
            config,
            devices: Vec::new(),
            cursor: 0,
            connection: ConnectionState::Connecting,
            snapshots: 0,
            events,
        }
    }

    /// Apply pending live channel events
    pub fn tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: LiveEvent) {
        match event {
            LiveEvent::Connected => self.connection = ConnectionState::Live,
            LiveEvent::Snapshot(snapshot) => self.set_snapshot(snapshot),
            LiveEvent::Disconnected(reason) => self.connection = ConnectionState::Disconnected(reason),
        }
    }

    /// Replace the device list, keeping the cursor on the same device
    fn set_snapshot(&mut self, snapshot: Snapshot) {
        let selected_id = self.selected().map(|d| d.device_id.clone());

        self.devices = snapshot;
        self.snapshots += 1;

        self.cursor = selected_id
            .and_then(|id| self.devices.iter().position(|d| d.device_id == id))
            .unwrap_or_else(|| self.cursor.min(self.devices.len().saturating_sub(1)));
    }

    pub fn selected(&self) -> Option<&DeviceRecord> {
        self.devices.get(self.cursor)
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.devices.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_bottom(&mut self) {
        self.cursor = self.devices.len().saturating_sub(1);
    }
}
