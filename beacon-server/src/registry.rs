//! Connection registry: the set of open live channels

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ChannelId = Uuid;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Live channel {0} is closed")]
    Closed(ChannelId),
}

/// One open push connection to a browser
///
/// Outbound frames are queued here and written to the socket by the
/// channel's own task. The queue is unbounded.
pub struct LiveChannel {
    pub id: ChannelId,
    sender: mpsc::UnboundedSender<String>,
}

impl LiveChannel {
    /// Queue a text frame for this channel
    pub fn push(&self, text: String) -> Result<(), PushError> {
        self.sender.send(text).map_err(|_| PushError::Closed(self.id))
    }
}

/// Registered live channels keyed by id
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: HashMap<ChannelId, LiveChannel>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new channel and hand back its outbound queue
    pub fn register(&mut self) -> (ChannelId, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.channels.insert(id, LiveChannel { id, sender });
        (id, receiver)
    }

    /// Remove a channel; returns whether it was registered
    pub fn unregister(&mut self, id: &ChannelId) -> bool {
        self.channels.remove(id).is_some()
    }

    pub fn get(&self, id: &ChannelId) -> Option<&LiveChannel> {
        self.channels.get(id)
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.channels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveChannel> {
        self.channels.values()
    }
}
