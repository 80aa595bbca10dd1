// src/server/reload.rs

//! Live-reload signalling.
//!
//! The runtime only knows the [`ReloadNotifier`] trait. [`ReloadHub`] fans
//! the signal out to every subscriber over a broadcast channel; whatever
//! talks to the browser subscribes to the hub.

use tokio::sync::broadcast;
use tracing::{debug, info};

/// Something that can tell connected clients to refresh.
pub trait ReloadNotifier: Send + Sync {
    /// `changed` names the task whose output changed.
    fn notify_clients_to_reload(&self, changed: &str);
}

#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<String>,
}

impl ReloadHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ReloadNotifier for ReloadHub {
    fn notify_clients_to_reload(&self, changed: &str) {
        match self.tx.send(changed.to_string()) {
            Ok(clients) => info!(task = %changed, clients, "reloading clients"),
            Err(_) => debug!(task = %changed, "no reload clients connected"),
        }
    }
}
