//! Whole-list reconciliation for the shared vehicle table.
//!
//! Vehicles live under a single relay key as one serialized list, so any
//! client's write replaces the whole table for everyone: last write wins
//! at the granularity of the list. The bridge publishes only when the
//! local table drifts from the last published snapshot, and reconciles
//! inbound lists entry by entry so unchanged vehicles keep their identity.

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::relay::RelayConnection;
use crate::world::{EntityStore, Vehicle, VehicleTable};

use super::echo::EchoGate;
use super::envelope::SyncEnvelope;
use super::error::SyncError;
use super::keys::VEHICLES_KEY;

/// Wire form of one vehicle inside the `ships` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub is_controlled: Option<String>,
}

impl VehicleRecord {
    fn from_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id.clone(),
            position: vehicle.position.to_array(),
            rotation: vehicle.rotation.to_array(),
            is_controlled: vehicle.controlling_user_id.clone(),
        }
    }

    fn to_vehicle(&self) -> Vehicle {
        Vehicle {
            id: self.id.clone(),
            position: Vec3::from_array(self.position),
            rotation: Vec3::from_array(self.rotation),
            controlling_user_id: self.is_controlled.clone(),
        }
    }

    fn matches(&self, other: &VehicleRecord, epsilon: f32) -> bool {
        self.id == other.id
            && self.is_controlled == other.is_controlled
            && triple_close(self.position, other.position, epsilon)
            && triple_close(self.rotation, other.rotation, epsilon)
    }
}

fn triple_close(a: [f32; 3], b: [f32; 3], epsilon: f32) -> bool {
    a.iter().zip(&b).all(|(x, y)| (x - y).abs() <= epsilon)
}

fn lists_match(a: &[VehicleRecord], b: &[VehicleRecord], epsilon: f32) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y, epsilon))
}

pub struct VehicleBridge {
    local_user_id: String,
    last_records: Vec<VehicleRecord>,
    gate: EchoGate,
}

impl VehicleBridge {
    pub fn new(local_user_id: &str) -> Self {
        Self {
            local_user_id: local_user_id.to_string(),
            last_records: Vec::new(),
            gate: EchoGate::new(),
        }
    }

    /// Outbound path: publish the current table when it differs from the
    /// last published snapshot. Cheap to call every frame.
    pub fn publish<R: RelayConnection>(
        &mut self,
        vehicles: &VehicleTable,
        relay: &mut R,
        epsilon: f32,
    ) {
        let records: Vec<VehicleRecord> =
            vehicles.iter().map(VehicleRecord::from_vehicle).collect();
        if lists_match(&self.last_records, &records, epsilon) {
            return;
        }

        let seq = self.gate.published();
        let body = match serde_json::to_value(&records) {
            Ok(body) => body,
            Err(_) => {
                warn!(
                    "{}",
                    SyncError::EncodeFailed {
                        key: VEHICLES_KEY.to_string()
                    }
                );
                return;
            }
        };
        match SyncEnvelope::new(&self.local_user_id, seq, body).into_value(VEHICLES_KEY) {
            Ok(value) => {
                if let Err(err) = relay.write(VEHICLES_KEY, value) {
                    warn!("relay write for {VEHICLES_KEY} failed: {err}");
                }
            }
            Err(err) => warn!("{err}"),
        }
        self.last_records = records;
    }

    /// Inbound path: reconcile a delivered list into the table. Applies
    /// to the store and the snapshot; never writes to the relay.
    pub fn receive(&mut self, store: &mut EntityStore, value: &Value, epsilon: f32) {
        let envelope = match SyncEnvelope::parse(value, VEHICLES_KEY) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("discarding update: {err}");
                return;
            }
        };
        let origin_is_local = envelope.origin == self.local_user_id;
        if !self.gate.classify(origin_is_local, envelope.seq).applies() {
            return;
        }

        let records: Vec<VehicleRecord> = match serde_json::from_value(envelope.body) {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "discarding update: {}",
                    SyncError::MalformedPayload {
                        key: VEHICLES_KEY.to_string(),
                        detail: err.to_string(),
                    }
                );
                return;
            }
        };

        let mut next = Vec::with_capacity(records.len());
        for record in &records {
            match store.vehicles.get(&record.id) {
                Some(existing) => {
                    if existing.controlling_user_id != record.is_controlled {
                        info!(
                            "vehicle {} control changed: {:?} -> {:?}",
                            record.id, existing.controlling_user_id, record.is_controlled
                        );
                    }
                    let incoming = record.to_vehicle();
                    let mut updated = existing.clone();
                    if !updated.position.abs_diff_eq(incoming.position, epsilon) {
                        updated.position = incoming.position;
                    }
                    if !updated.rotation.abs_diff_eq(incoming.rotation, epsilon) {
                        updated.rotation = incoming.rotation;
                    }
                    updated.controlling_user_id = incoming.controlling_user_id;
                    next.push(updated);
                }
                None => next.push(record.to_vehicle()),
            }
        }
        store.vehicles.replace_all(next);
        self.last_records = records;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::relay::MemoryRelayHub;

    use super::*;

    const EPS: f32 = 0.001;

    #[test]
    fn unchanged_table_is_not_republished() {
        let hub = MemoryRelayHub::new();
        let mut relay = hub.connect("me", "Me");
        let mut table = VehicleTable::new();
        table.add(Vehicle::new("ship_1", Vec3::ZERO, Vec3::ZERO));
        let mut bridge = VehicleBridge::new("me");

        bridge.publish(&table, &mut relay, EPS);
        bridge.publish(&table, &mut relay, EPS);

        assert_eq!(hub.write_count(VEHICLES_KEY), 1);
    }

    #[test]
    fn inbound_list_adds_updates_and_removes() {
        let mut store = EntityStore::new();
        store
            .vehicles
            .add(Vehicle::new("ship_1", Vec3::ZERO, Vec3::ZERO));
        store
            .vehicles
            .add(Vehicle::new("ship_2", Vec3::ZERO, Vec3::ZERO));
        let mut bridge = VehicleBridge::new("me");

        let body = json!([
            {"id": "ship_1", "position": [4.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0], "isControlled": "pilot"},
            {"id": "ship_3", "position": [1.0, 1.0, 1.0], "rotation": [0.0, 0.5, 0.0], "isControlled": null},
        ]);
        let value = SyncEnvelope::new("peer", 1, body)
            .into_value(VEHICLES_KEY)
            .unwrap();

        bridge.receive(&mut store, &value, EPS);

        assert_eq!(store.vehicles.len(), 2);
        let ship_1 = store.vehicles.get("ship_1").unwrap();
        assert_eq!(ship_1.position, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(ship_1.controlling_user_id.as_deref(), Some("pilot"));
        assert!(store.vehicles.get("ship_2").is_none());
        assert!(store.vehicles.get("ship_3").is_some());
    }

    #[test]
    fn malformed_list_is_discarded() {
        let mut store = EntityStore::new();
        store
            .vehicles
            .add(Vehicle::new("ship_1", Vec3::ZERO, Vec3::ZERO));
        let mut bridge = VehicleBridge::new("me");

        let value = SyncEnvelope::new("peer", 1, json!({"not": "a list"}))
            .into_value(VEHICLES_KEY)
            .unwrap();
        bridge.receive(&mut store, &value, EPS);

        assert_eq!(store.vehicles.len(), 1);
    }

    #[test]
    fn own_echo_does_not_feed_back() {
        let hub = MemoryRelayHub::new();
        let mut relay = hub.connect("me", "Me");
        let mut store = EntityStore::new();
        store
            .vehicles
            .add(Vehicle::new("ship_1", Vec3::ZERO, Vec3::ZERO));
        let mut bridge = VehicleBridge::new("me");

        bridge.publish(&store.vehicles, &mut relay, EPS);
        hub.deliver_all();
        let echo = hub.value(VEHICLES_KEY).unwrap();

        bridge.receive(&mut store, &echo, EPS);
        bridge.publish(&store.vehicles, &mut relay, EPS);

        assert_eq!(hub.write_count(VEHICLES_KEY), 1);
    }
}
