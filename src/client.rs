//! The per-client world session.
//!
//! `WorldClient` owns the entity store, the sync bridges, the interaction
//! pass, and the camera flag, and wires them to one relay connection. The
//! embedding game loop drives it with a handful of entry points:
//!
//! - `tick()` once per frame, after physics;
//! - `update_local_transform(..)` with the freshly simulated transform;
//! - `key_down(..)` from the discrete key-down event (never from polled
//!   key state, or a held key would fire every frame);
//! - the vehicle verbs (`spawn_vehicle`, `enter_vehicle`, `exit_vehicle`).
//!
//! Everything else (roster reconciliation, bridge lifecycle, orphaned
//! control release, boarding-zone upkeep) happens inside `tick`.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use log::{info, trace, warn};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::camera::{CameraMode, CameraState};
use crate::config::WorldConfig;
use crate::interact::{
    InteractionEvent, InteractionRegistry, InteractionScheduler, InteractiveObject, ObjectKind,
};
use crate::relay::RelayConnection;
use crate::sync::{PlayerBridge, RosterTracker, SyncKey, VehicleBridge};
use crate::world::{ControlError, EntityStore, Vehicle};

pub struct WorldClient<R: RelayConnection> {
    relay: R,
    config: WorldConfig,
    local_user_id: String,
    store: EntityStore,
    registry: InteractionRegistry,
    scheduler: InteractionScheduler,
    camera: CameraState,
    player_bridges: HashMap<String, PlayerBridge>,
    vehicle_bridge: VehicleBridge,
    roster: RosterTracker,
}

impl<R: RelayConnection> WorldClient<R> {
    pub fn new(relay: R, config: WorldConfig) -> Self {
        let local_user_id = relay.local_user_id().to_string();
        let mut player_bridges = HashMap::new();
        player_bridges.insert(
            local_user_id.clone(),
            PlayerBridge::new(&local_user_id, true),
        );
        Self {
            vehicle_bridge: VehicleBridge::new(&local_user_id),
            relay,
            config,
            local_user_id,
            store: EntityStore::new(),
            registry: InteractionRegistry::new(),
            scheduler: InteractionScheduler::new(),
            camera: CameraState::new(),
            player_bridges,
            roster: RosterTracker::new(),
        }
    }

    /// Run one frame of housekeeping: roster, inbound sync, boarding-zone
    /// upkeep, the proximity pass, and the vehicle-list catch-all publish.
    pub fn tick(&mut self) {
        self.sync_roster();
        self.drain_relay();
        self.sync_vehicle_interactions();
        self.scheduler.tick(&self.store.players, &mut self.registry);
        self.vehicle_bridge
            .publish(&self.store.vehicles, &mut self.relay, self.config.change_epsilon);
    }

    /// Publish the freshly simulated local transform. Called once per
    /// frame by the simulation loop; sub-epsilon movement goes nowhere.
    pub fn update_local_transform(&mut self, position: Vec3, yaw: f32) {
        let epsilon = self.config.change_epsilon;
        if let Some(bridge) = self.player_bridges.get_mut(&self.local_user_id) {
            bridge.publish_transform(&mut self.store, &mut self.relay, position, yaw, epsilon);
        }
    }

    /// Spawn the local avatar, at an explicit position or wherever the
    /// store's spawn locator puts it, and publish the result.
    pub fn spawn_local(&mut self, position: Option<Vec3>) {
        self.store.spawn_player(&self.local_user_id, position);
        let Some(player) = self.store.players.get(&self.local_user_id) else {
            trace!("local player not in roster yet, spawn deferred");
            return;
        };
        let (position, yaw) = (player.position, player.yaw);
        self.update_local_transform(position, yaw);
        self.set_local_spawned(true);
        self.store.players.set_camera_owner(&self.local_user_id, true);
    }

    pub fn despawn_local(&mut self) {
        self.set_local_spawned(false);
    }

    fn set_local_spawned(&mut self, spawned: bool) {
        if let Some(bridge) = self.player_bridges.get_mut(&self.local_user_id) {
            bridge.publish_spawned(&mut self.store, &mut self.relay, spawned);
        }
    }

    /// Dispatch a physical key press for the local player, and apply the
    /// engine-owned vehicle behaviors for whatever it hit.
    ///
    /// Leaving a vehicle is bound directly to the exit key rather than to
    /// an interaction zone: the piloting avatar is despawned, and the
    /// proximity pass only considers spawned players.
    pub fn key_down(&mut self, key: &str) {
        if key.eq_ignore_ascii_case(EXIT_KEY)
            && self
                .store
                .vehicles
                .controlled_by(&self.local_user_id)
                .is_some()
        {
            if let Err(err) = self.exit_vehicle() {
                info!("disembark refused: {err}");
            }
            return;
        }

        let fired = self
            .scheduler
            .trigger(&mut self.registry, &self.local_user_id, key);
        for (interaction, kind) in fired {
            match kind {
                ObjectKind::VehicleEntrance { vehicle_id } => {
                    if let Err(err) = self.enter_vehicle(&vehicle_id) {
                        info!("boarding refused: {err}");
                    }
                }
                ObjectKind::VehicleSpawner => {
                    self.spawn_vehicle_near(interaction.object_position);
                }
                ObjectKind::Collectible | ObjectKind::Custom(_) => {}
            }
        }
    }

    /// Add a vehicle to the world and announce it. Returns the generated
    /// id, or None when the id collided (retry on the next press).
    pub fn spawn_vehicle(&mut self, position: Vec3, rotation: Vec3) -> Option<String> {
        let id = generate_vehicle_id();
        if !self.store.vehicles.add(Vehicle::new(id.clone(), position, rotation)) {
            return None;
        }
        info!("spawned vehicle {id}");
        self.publish_vehicles();
        Some(id)
    }

    /// Remove a vehicle outright. The only deletion path; disconnects
    /// merely release control.
    pub fn remove_vehicle(&mut self, vehicle_id: &str) -> bool {
        let removed = self.store.vehicles.remove(vehicle_id).is_some();
        if removed {
            self.publish_vehicles();
        }
        removed
    }

    /// Take control of a vehicle and step out of the avatar. Control and
    /// despawn are coordinated but not atomic: control lands first, so a
    /// failure leaves the avatar walking around.
    pub fn enter_vehicle(&mut self, vehicle_id: &str) -> Result<(), ControlError> {
        self.store.vehicles.control(vehicle_id, &self.local_user_id)?;
        self.despawn_local();
        self.camera.set_mode(CameraMode::Vehicle);
        self.publish_vehicles();
        Ok(())
    }

    /// Release the piloted vehicle and respawn the avatar just above it.
    pub fn exit_vehicle(&mut self) -> Result<(), ControlError> {
        let vehicle = self
            .store
            .vehicles
            .controlled_by(&self.local_user_id)
            .cloned()
            .ok_or_else(|| ControlError::NotPiloting {
                user_id: self.local_user_id.clone(),
            })?;
        self.store.vehicles.release(&vehicle.id);
        let exit_position =
            vehicle.position + Vec3::new(0.0, self.config.vehicle_exit_lift, 0.0);
        self.spawn_local(Some(exit_position));
        self.camera.set_mode(CameraMode::Player);
        self.publish_vehicles();
        Ok(())
    }

    /// Move the piloted vehicle with the freshly simulated transform.
    /// Published by the catch-all at the end of the frame.
    pub fn update_controlled_vehicle(&mut self, position: Vec3, rotation: Vec3) {
        let Some(id) = self
            .store
            .vehicles
            .controlled_by(&self.local_user_id)
            .map(|v| v.id.clone())
        else {
            trace!("no controlled vehicle to move, ignoring");
            return;
        };
        self.store.vehicles.set_position(&id, position);
        self.store.vehicles.set_rotation(&id, rotation);
    }

    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut InteractionRegistry {
        &mut self.registry
    }

    pub fn interactions(&self) -> &InteractionScheduler {
        &self.scheduler
    }

    pub fn drain_interaction_events(&mut self) -> Vec<InteractionEvent> {
        self.scheduler.drain_events()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    // Roster pass: reconcile tables, flags, bridges, and orphaned control
    // against the connected-user list. Cheap no-op when nothing changed.
    fn sync_roster(&mut self) {
        let ids = self.relay.connected_user_ids();
        let mut nicknames = BTreeMap::new();
        for id in &ids {
            if let Some(nickname) = self.relay.nickname_of(id) {
                nicknames.insert(id.clone(), nickname);
            }
        }
        if !self.roster.observe(&ids, &nicknames) {
            return;
        }

        self.store.players.upsert_from_roster(&ids, &nicknames);
        if self.store.players.get(&self.local_user_id).is_some() {
            self.store.players.set_controller(&self.local_user_id, true);
        }

        let released = self.store.vehicles.release_orphaned(&ids);

        let local = self.local_user_id.clone();
        self.player_bridges
            .retain(|id, _| ids.contains(id) || *id == local);
        for id in &ids {
            if !self.player_bridges.contains_key(id) {
                self.player_bridges
                    .insert(id.clone(), PlayerBridge::new(id, false));
            }
        }

        if !released.is_empty() {
            self.publish_vehicles();
        }
    }

    fn drain_relay(&mut self) {
        let epsilon = self.config.change_epsilon;
        let updates = self.relay.drain_updates();
        for update in updates {
            match SyncKey::parse(&update.key) {
                Some(SyncKey::Vehicles) => {
                    self.vehicle_bridge
                        .receive(&mut self.store, &update.value, epsilon);
                }
                Some(key) => {
                    let Some(user_id) = key.user_id() else {
                        continue;
                    };
                    match self.player_bridges.get_mut(user_id) {
                        Some(bridge) => bridge.receive(
                            &mut self.store,
                            &key,
                            &update.key,
                            &update.value,
                            &self.local_user_id,
                            epsilon,
                        ),
                        None => trace!("update for untracked player {user_id}, ignoring"),
                    }
                }
                None => {}
            }
        }
    }

    // Keep the engine-owned boarding zones shadowing the vehicle table:
    // one zone around every unpiloted vehicle, none around piloted ones.
    fn sync_vehicle_interactions(&mut self) {
        let boardable: Vec<(String, Vec3)> = self
            .store
            .vehicles
            .iter()
            .filter(|v| v.controlling_user_id.is_none())
            .map(|v| (v.id.clone(), v.position))
            .collect();

        let stale: Vec<String> = self
            .registry
            .ids()
            .filter(|id| {
                id.strip_prefix(ENTER_ZONE_PREFIX)
                    .is_some_and(|vehicle_id| !boardable.iter().any(|(b, _)| b == vehicle_id))
            })
            .cloned()
            .collect();
        for id in stale {
            self.registry.unregister(&id);
        }

        for (vehicle_id, position) in boardable {
            let zone_id = format!("{ENTER_ZONE_PREFIX}{vehicle_id}");
            if self.registry.contains(&zone_id) {
                self.registry.move_object(&zone_id, position);
            } else {
                self.registry.register(
                    InteractiveObject::new(
                        zone_id,
                        ObjectKind::VehicleEntrance { vehicle_id },
                        position,
                    )
                    .with_radius(self.config.vehicle_enter_radius)
                    .with_prompt_text("Board the ship (E)"),
                );
            }
        }
    }

    fn spawn_vehicle_near(&mut self, origin: Vec3) {
        let mut rng = rand::rng();
        let position = origin
            + Vec3::new(
                rng.random_range(-10.0..=10.0),
                2.0,
                rng.random_range(-10.0..=10.0),
            );
        let rotation = Vec3::new(0.0, rng.random_range(0.0..std::f32::consts::TAU), 0.0);
        self.spawn_vehicle(position, rotation);
    }

    fn publish_vehicles(&mut self) {
        self.vehicle_bridge
            .publish(&self.store.vehicles, &mut self.relay, self.config.change_epsilon);
    }
}

const ENTER_ZONE_PREFIX: &str = "vehicle-enter-";

/// Key that disembarks the piloted vehicle.
const EXIT_KEY: &str = "x";

// Caller-visible vehicle ids are derived from the wall clock plus a short
// random suffix, unique enough for a handful of spawns per session.
fn generate_vehicle_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_else(|_| {
            warn!("system clock is before the epoch, vehicle id falls back to 0");
            0
        });
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("ship_{millis}_{}", suffix.to_lowercase())
}
