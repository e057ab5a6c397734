//! # Driftworld
//! Distributed entity synchronization and spatial interaction for
//! relay-backed multiplayer sandboxes.
//!
//! Each client simulates its own world and owns its own avatar and the
//! vehicle it pilots. This crate keeps those worlds converged through a
//! dumb last-write-wins key/value relay: it publishes locally
//! authoritative changes, ingests remote ones without echoing them back,
//! enforces exclusive vehicle control, and runs the per-frame proximity
//! pass that drives interactions.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod camera;
mod client;
mod config;
mod interact;
mod relay;
mod sync;
mod world;

pub use camera::{CameraMode, CameraState};
pub use client::WorldClient;
pub use config::WorldConfig;
pub use interact::{
    ActiveInteraction, InteractHandler, InteractionEvent, InteractionRegistry,
    InteractionScheduler, InteractionStats, InteractiveObject, ObjectKind, ObjectPatch,
    PromptRender,
};
pub use relay::{MemoryRelay, MemoryRelayHub, RelayConnection, RelayError, RelayUpdate};
pub use sync::{
    player_position_key, player_spawned_key, player_yaw_key, EchoClass, EchoGate, PlayerBridge,
    RosterTracker, SyncEnvelope, SyncError, SyncKey, VehicleBridge, VehicleRecord, VEHICLES_KEY,
};
pub use world::{
    ControlError, DeckSpawnLocator, EntityStore, FixedSpawnLocator, Player, PlayerTable,
    SpawnLocator, Vehicle, VehicleTable,
};
