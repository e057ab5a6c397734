//! In-process relay with explicit, steppable delivery.
//!
//! `MemoryRelayHub` plays the role of the hosted relay service: it owns the
//! settled key/value state and a queue of writes that have not yet been
//! replicated. Tests drive delivery by hand with [`deliver_next`] and
//! [`deliver_all`] to script races, reorderings, and echoes.
//!
//! [`deliver_next`]: MemoryRelayHub::deliver_next
//! [`deliver_all`]: MemoryRelayHub::deliver_all

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{RelayConnection, RelayError, RelayUpdate};

struct ClientSlot {
    nickname: String,
    connected: bool,
    inbox: Vec<RelayUpdate>,
}

struct HubInner {
    store: HashMap<String, Value>,
    pending: Vec<(String, Value)>,
    clients: HashMap<String, ClientSlot>,
    // Session order of first connection, drives the roster ordering.
    order: Vec<String>,
    write_counts: HashMap<String, u64>,
}

impl HubInner {
    fn roster(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.clients.get(*id).is_some_and(|c| c.connected))
            .cloned()
            .collect()
    }

    fn deliver(&mut self, key: String, value: Value) {
        self.store.insert(key.clone(), value.clone());
        for slot in self.clients.values_mut() {
            if slot.connected {
                slot.inbox.push(RelayUpdate {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
    }
}

/// The shared hub every [`MemoryRelay`] handle points at.
#[derive(Clone)]
pub struct MemoryRelayHub {
    inner: Arc<RwLock<HubInner>>,
}

impl MemoryRelayHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HubInner {
                store: HashMap::new(),
                pending: Vec::new(),
                clients: HashMap::new(),
                order: Vec::new(),
                write_counts: HashMap::new(),
            })),
        }
    }

    /// Join the session and get a client handle.
    ///
    /// Reconnecting an id that already joined reuses its roster slot.
    pub fn connect(&self, user_id: &str, nickname: &str) -> MemoryRelay {
        if let Ok(mut inner) = self.inner.write() {
            if !inner.clients.contains_key(user_id) {
                inner.order.push(user_id.to_string());
            }
            inner.clients.insert(
                user_id.to_string(),
                ClientSlot {
                    nickname: nickname.to_string(),
                    connected: true,
                    inbox: Vec::new(),
                },
            );
        }
        MemoryRelay {
            user_id: user_id.to_string(),
            inner: self.inner.clone(),
        }
    }

    /// Change a connected client's display name.
    pub fn set_nickname(&self, user_id: &str, nickname: &str) {
        if let Ok(mut inner) = self.inner.write() {
            if let Some(slot) = inner.clients.get_mut(user_id) {
                slot.nickname = nickname.to_string();
            }
        }
    }

    /// Drop a client from the roster. Its queued writes still replicate;
    /// a real relay does not unsend packets already accepted.
    pub fn disconnect(&self, user_id: &str) {
        if let Ok(mut inner) = self.inner.write() {
            if let Some(slot) = inner.clients.get_mut(user_id) {
                slot.connected = false;
                slot.inbox.clear();
            }
        }
    }

    /// Replicate the oldest queued write to every connected client,
    /// including the writer. Returns false when the queue is empty.
    pub fn deliver_next(&self) -> bool {
        let Ok(mut inner) = self.inner.write() else {
            return false;
        };
        if inner.pending.is_empty() {
            return false;
        }
        let (key, value) = inner.pending.remove(0);
        inner.deliver(key, value);
        true
    }

    /// Replicate every queued write in arrival order.
    pub fn deliver_all(&self) {
        while self.deliver_next() {}
    }

    /// Number of writes still waiting for replication.
    pub fn pending_len(&self) -> usize {
        self.inner.read().map(|i| i.pending.len()).unwrap_or(0)
    }

    /// The settled value for a key, once delivery has run.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.read().ok()?.store.get(key).cloned()
    }

    /// How many writes a key has accepted over the session's lifetime.
    pub fn write_count(&self, key: &str) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|i| i.write_counts.get(key).copied())
            .unwrap_or(0)
    }
}

impl Default for MemoryRelayHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One client's connection to a [`MemoryRelayHub`].
pub struct MemoryRelay {
    user_id: String,
    inner: Arc<RwLock<HubInner>>,
}

impl RelayConnection for MemoryRelay {
    fn local_user_id(&self) -> &str {
        &self.user_id
    }

    fn connected_user_ids(&self) -> Vec<String> {
        self.inner.read().map(|i| i.roster()).unwrap_or_default()
    }

    fn nickname_of(&self, user_id: &str) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let slot = inner.clients.get(user_id)?;
        if slot.connected {
            Some(slot.nickname.clone())
        } else {
            None
        }
    }

    fn read(&self, key: &str) -> Option<Value> {
        self.inner.read().ok()?.store.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: Value) -> Result<(), RelayError> {
        let Ok(mut inner) = self.inner.write() else {
            return Err(RelayError::Disconnected {
                user_id: self.user_id.clone(),
            });
        };
        let connected = inner
            .clients
            .get(&self.user_id)
            .is_some_and(|c| c.connected);
        if !connected {
            return Err(RelayError::Disconnected {
                user_id: self.user_id.clone(),
            });
        }
        *inner.write_counts.entry(key.to_string()).or_insert(0) += 1;
        inner.pending.push((key.to_string(), value));
        Ok(())
    }

    fn drain_updates(&mut self) -> Vec<RelayUpdate> {
        let Ok(mut inner) = self.inner.write() else {
            return Vec::new();
        };
        inner
            .clients
            .get_mut(&self.user_id)
            .map(|slot| std::mem::take(&mut slot.inbox))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn writes_replicate_to_all_clients_in_order() {
        let hub = MemoryRelayHub::new();
        let mut a = hub.connect("user_a", "Ada");
        let mut b = hub.connect("user_b", "Brin");

        a.write("counter", json!(1)).unwrap();
        b.write("counter", json!(2)).unwrap();
        assert_eq!(hub.pending_len(), 2);

        hub.deliver_all();

        // Last write wins at the hub.
        assert_eq!(hub.value("counter"), Some(json!(2)));
        // Both clients saw both deliveries, own writes included.
        assert_eq!(a.drain_updates().len(), 2);
        assert_eq!(b.drain_updates().len(), 2);
    }

    #[test]
    fn disconnect_removes_from_roster_but_keeps_queued_writes() {
        let hub = MemoryRelayHub::new();
        let mut a = hub.connect("user_a", "Ada");
        let b = hub.connect("user_b", "Brin");

        a.write("k", json!("from_a")).unwrap();
        hub.disconnect("user_a");

        assert_eq!(b.connected_user_ids(), vec!["user_b".to_string()]);
        assert!(b.nickname_of("user_a").is_none());

        hub.deliver_all();
        assert_eq!(hub.value("k"), Some(json!("from_a")));
        assert!(a.write("k", json!("late")).is_err());
    }
}
