//! Two-way reconciliation between the entity store and the relay.
//!
//! The outbound path publishes locally-authoritative changes; the inbound
//! path applies remote changes without republishing them. Echo freedom is
//! guaranteed by the envelope's origin and sequence stamp, not by timing.

mod echo;
mod envelope;
mod error;
mod keys;
mod player_bridge;
mod roster;
mod vehicle_bridge;

pub use echo::{EchoClass, EchoGate};
pub use envelope::SyncEnvelope;
pub use error::SyncError;
pub use keys::{
    player_position_key, player_spawned_key, player_yaw_key, SyncKey, VEHICLES_KEY,
};
pub use player_bridge::PlayerBridge;
pub use roster::RosterTracker;
pub use vehicle_bridge::{VehicleBridge, VehicleRecord};
