//! The relay boundary.
//!
//! The relay is an external shared key/value transport: last-write-wins,
//! no server-side logic, eventual unordered delivery to every connected
//! peer. This module defines the narrow interface the engine consumes and
//! an in-process reference implementation used by tests.

use serde_json::Value;
use thiserror::Error;

mod memory;

pub use memory::{MemoryRelay, MemoryRelayHub};

/// A key/value change delivered by the relay.
///
/// Deliveries include the sender's own writes bouncing back; echo
/// classification is the sync layer's job, not the transport's.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayUpdate {
    pub key: String,
    pub value: Value,
}

/// Errors surfaced by a relay connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The connection is no longer part of the session.
    #[error("relay connection for user {user_id} is disconnected")]
    Disconnected { user_id: String },
}

/// One client's handle on the shared relay session.
///
/// Reads are snapshots of the locally-known settled state; writes are
/// fire-and-forget; remote changes are polled off with [`drain_updates`]
/// once per simulation frame rather than delivered by callback.
///
/// [`drain_updates`]: RelayConnection::drain_updates
pub trait RelayConnection {
    /// The user id the session layer assigned to this client.
    fn local_user_id(&self) -> &str;

    /// Currently connected user ids, in stable session order.
    fn connected_user_ids(&self) -> Vec<String>;

    /// Display name for a connected user, if one was provided.
    fn nickname_of(&self, user_id: &str) -> Option<String>;

    /// Last known value for a key.
    fn read(&self, key: &str) -> Option<Value>;

    /// Publish a value. Replication to peers is asynchronous.
    fn write(&mut self, key: &str, value: Value) -> Result<(), RelayError>;

    /// Take all key changes delivered since the last drain.
    fn drain_updates(&mut self) -> Vec<RelayUpdate>;
}
