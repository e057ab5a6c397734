//! Per-player reconciliation between the entity store and the relay.
//!
//! One bridge exists per connected user id for the whole session; only the
//! local user's bridge publishes, every bridge ingests. The bridge keeps a
//! last-seen snapshot of the tracked fields separately from the store's
//! live value: the snapshot is the last value this bridge itself wrote or
//! applied, and both directions diff against it with a small epsilon so
//! jitter-level noise never crosses the boundary in either direction.

use glam::Vec3;
use log::{trace, warn};

use crate::relay::RelayConnection;
use crate::world::EntityStore;

use super::echo::EchoGate;
use super::envelope::{
    position_from_body, position_to_body, spawned_from_body, spawned_to_body, yaw_from_body,
    yaw_to_body, SyncEnvelope,
};
use super::keys::{player_position_key, player_spawned_key, player_yaw_key, SyncKey};

pub struct PlayerBridge {
    user_id: String,
    /// Whether the tracked player is this client's own avatar. Remote
    /// bridges never publish.
    local: bool,
    last_position: Vec3,
    last_yaw: f32,
    last_spawned: bool,
    position_gate: EchoGate,
    yaw_gate: EchoGate,
    spawned_gate: EchoGate,
}

impl PlayerBridge {
    pub fn new(user_id: &str, local: bool) -> Self {
        Self {
            user_id: user_id.to_string(),
            local,
            last_position: Vec3::ZERO,
            last_yaw: 0.0,
            last_spawned: false,
            position_gate: EchoGate::new(),
            yaw_gate: EchoGate::new(),
            spawned_gate: EchoGate::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Outbound path, called by the simulation loop once per frame with
    /// the freshly computed local transform. Fields that moved beyond the
    /// epsilon are written to the relay, applied to the store, and folded
    /// into the snapshot.
    pub fn publish_transform<R: RelayConnection>(
        &mut self,
        store: &mut EntityStore,
        relay: &mut R,
        position: Vec3,
        yaw: f32,
        epsilon: f32,
    ) {
        if !self.local {
            trace!("publish_transform on remote bridge {}, ignoring", self.user_id);
            return;
        }

        if !position.abs_diff_eq(self.last_position, epsilon) {
            let seq = self.position_gate.published();
            self.write(relay, &player_position_key(&self.user_id), seq, position_to_body(position));
            store.players.set_position(&self.user_id, position);
            self.last_position = position;
        }

        if (yaw - self.last_yaw).abs() > epsilon {
            let seq = self.yaw_gate.published();
            self.write(relay, &player_yaw_key(&self.user_id), seq, yaw_to_body(yaw));
            store.players.set_yaw(&self.user_id, yaw);
            self.last_yaw = yaw;
        }
    }

    /// Outbound path for the spawn flag.
    pub fn publish_spawned<R: RelayConnection>(
        &mut self,
        store: &mut EntityStore,
        relay: &mut R,
        spawned: bool,
    ) {
        if !self.local || spawned == self.last_spawned {
            return;
        }
        let seq = self.spawned_gate.published();
        self.write(relay, &player_spawned_key(&self.user_id), seq, spawned_to_body(spawned));
        if spawned {
            store.players.spawn(&self.user_id, self.last_position);
        } else {
            store.players.despawn(&self.user_id);
        }
        self.last_spawned = spawned;
    }

    /// Inbound path, called with an update for one of this bridge's keys.
    /// Applies to the store and the snapshot; never writes to the relay.
    pub fn receive(
        &mut self,
        store: &mut EntityStore,
        key: &SyncKey,
        raw_key: &str,
        value: &serde_json::Value,
        local_user_id: &str,
        epsilon: f32,
    ) {
        let envelope = match SyncEnvelope::parse(value, raw_key) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("discarding update: {err}");
                return;
            }
        };
        let origin_is_local = envelope.origin == local_user_id;

        match key {
            SyncKey::Position { .. } => {
                if !self.position_gate.classify(origin_is_local, envelope.seq).applies() {
                    return;
                }
                match position_from_body(&envelope.body, raw_key) {
                    Ok(position) => {
                        if !position.abs_diff_eq(self.last_position, epsilon) {
                            store.players.set_position(&self.user_id, position);
                            self.last_position = position;
                        }
                    }
                    Err(err) => warn!("discarding update: {err}"),
                }
            }
            SyncKey::Yaw { .. } => {
                if !self.yaw_gate.classify(origin_is_local, envelope.seq).applies() {
                    return;
                }
                match yaw_from_body(&envelope.body, raw_key) {
                    Ok(yaw) => {
                        if (yaw - self.last_yaw).abs() > epsilon {
                            store.players.set_yaw(&self.user_id, yaw);
                            self.last_yaw = yaw;
                        }
                    }
                    Err(err) => warn!("discarding update: {err}"),
                }
            }
            SyncKey::Spawned { .. } => {
                if !self.spawned_gate.classify(origin_is_local, envelope.seq).applies() {
                    return;
                }
                match spawned_from_body(&envelope.body, raw_key) {
                    Ok(spawned) => {
                        if spawned != self.last_spawned {
                            if spawned {
                                store.players.spawn(&self.user_id, self.last_position);
                            } else {
                                store.players.despawn(&self.user_id);
                            }
                            self.last_spawned = spawned;
                        }
                    }
                    Err(err) => warn!("discarding update: {err}"),
                }
            }
            SyncKey::Vehicles => {
                trace!("vehicle update routed to a player bridge, ignoring");
            }
        }
    }

    fn write<R: RelayConnection>(
        &self,
        relay: &mut R,
        key: &str,
        seq: u64,
        body: serde_json::Value,
    ) {
        match SyncEnvelope::new(&self.user_id, seq, body).into_value(key) {
            Ok(value) => {
                if let Err(err) = relay.write(key, value) {
                    warn!("relay write for {key} failed: {err}");
                }
            }
            Err(err) => warn!("{err}"),
        }
    }
}
