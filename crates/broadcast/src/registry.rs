use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::WireMessage;

/// The set of live subscribers.
///
/// Membership is the only per-client state. The transcription worker
/// publishes through the registry; connection tasks own the sockets and drain
/// their channel. Cloning shares the same set.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<Mutex<HashMap<u64, UnboundedSender<String>>>>,
    next_id: Arc<AtomicU64>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; returns its id and the message stream to forward.
    pub fn register(&self) -> (u64, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients
            .lock()
            .expect("client registry mutex poisoned")
            .insert(id, tx);
        tracing::info!(client = id, "subscriber connected");
        (id, rx)
    }

    /// Remove a subscriber after its connection ends.
    pub fn unregister(&self, id: u64) {
        let removed = self
            .clients
            .lock()
            .expect("client registry mutex poisoned")
            .remove(&id);
        if removed.is_some() {
            tracing::info!(client = id, "subscriber disconnected");
        }
    }

    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .expect("client registry mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `text` to every current subscriber.
    ///
    /// A subscriber whose channel is closed is removed only after the full
    /// sweep, so one failure never short-circuits delivery to the rest.
    pub fn broadcast(&self, text: &str) {
        let mut clients = self
            .clients
            .lock()
            .expect("client registry mutex poisoned");
        if clients.is_empty() {
            tracing::trace!("no subscribers, message not sent");
            return;
        }

        let mut failed = Vec::new();
        for (id, tx) in clients.iter() {
            if tx.send(text.to_string()).is_err() {
                failed.push(*id);
            }
        }
        for id in failed {
            tracing::debug!(client = id, "dropping unreachable subscriber");
            clients.remove(&id);
        }
    }

    /// Serialize and fan out one wire message.
    ///
    /// Zero subscribers is a no-op; encoding failures are logged, never
    /// propagated into the transcription pipeline.
    pub fn publish(&self, message: &WireMessage) {
        if self.is_empty() {
            return;
        }
        match message.to_json() {
            Ok(json) => self.broadcast(&json),
            Err(e) => tracing::warn!(error = %e, "failed to encode broadcast message"),
        }
    }

    /// Drop every sender, ending all connection forwarders.
    pub(crate) fn close_all(&self) {
        self.clients
            .lock()
            .expect("client registry mutex poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_with_zero_subscribers_is_noop() {
        let registry = ClientRegistry::new();
        registry.broadcast("nobody home");
        registry.publish(&WireMessage::connected());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let registry = ClientRegistry::new();
        let (_a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        registry.broadcast("hola");

        assert_eq!(rx_a.try_recv().unwrap(), "hola");
        assert_eq!(rx_b.try_recv().unwrap(), "hola");
    }

    #[test]
    fn test_failed_subscriber_removed_after_sweep() {
        let registry = ClientRegistry::new();
        let (_gone, rx_gone) = registry.register();
        let (_live, mut rx_live) = registry.register();
        drop(rx_gone);

        registry.broadcast("uno");
        // The live subscriber still got the message from the same sweep.
        assert_eq!(rx_live.try_recv().unwrap(), "uno");
        assert_eq!(registry.len(), 1);

        registry.broadcast("dos");
        assert_eq!(rx_live.try_recv().unwrap(), "dos");
    }

    #[test]
    fn test_unregister_shrinks_set() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.register();
        assert_eq!(registry.len(), 1);
        registry.unregister(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_all_ends_forwarders() {
        let registry = ClientRegistry::new();
        let (_id, mut rx) = registry.register();
        registry.close_all();
        assert!(rx.try_recv().is_err());
        assert!(registry.is_empty());
    }
}
