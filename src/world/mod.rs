//! Canonical in-process world state.
//!
//! The store is an explicitly constructed container handed to the sync
//! bridges, the interaction scheduler, and the UI layer. It holds the
//! player and vehicle tables plus the spawn-point collaborator; it knows
//! nothing about the relay.

use glam::Vec3;

mod player;
mod spawn;
mod vehicle;

pub use player::{Player, PlayerTable};
pub use spawn::{DeckSpawnLocator, FixedSpawnLocator, SpawnLocator};
pub use vehicle::{ControlError, Vehicle, VehicleTable};

pub struct EntityStore {
    pub players: PlayerTable,
    pub vehicles: VehicleTable,
    locator: Box<dyn SpawnLocator>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::with_locator(Box::new(DeckSpawnLocator::default()))
    }

    pub fn with_locator(locator: Box<dyn SpawnLocator>) -> Self {
        Self {
            players: PlayerTable::new(),
            vehicles: VehicleTable::new(),
            locator,
        }
    }

    /// Spawn an avatar, falling back to the spawn locator when the caller
    /// has no position in mind.
    pub fn spawn_player(&mut self, user_id: &str, position: Option<Vec3>) {
        let position = position.unwrap_or_else(|| self.locator.spawn_position());
        self.players.spawn(user_id, position);
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
