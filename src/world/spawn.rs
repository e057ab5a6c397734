//! Spawn-point selection for avatars entering the world.

use glam::Vec3;
use rand::Rng;

/// Supplies a world position for an avatar spawned without an explicit one.
pub trait SpawnLocator {
    fn spawn_position(&mut self) -> Vec3;
}

/// Spawns avatars on the deck of the mothership, scattered so that players
/// joining in the same instant do not stack inside each other.
pub struct DeckSpawnLocator {
    pub deck: Vec3,
    pub scatter: f32,
    pub lift: f32,
}

impl Default for DeckSpawnLocator {
    fn default() -> Self {
        Self {
            deck: Vec3::new(-17.0, 0.1, 75.0),
            scatter: 5.0,
            lift: 2.0,
        }
    }
}

impl SpawnLocator for DeckSpawnLocator {
    fn spawn_position(&mut self) -> Vec3 {
        let mut rng = rand::rng();
        let dx: f32 = rng.random_range(-self.scatter..=self.scatter);
        let dz: f32 = rng.random_range(-self.scatter..=self.scatter);
        self.deck + Vec3::new(dx, self.lift, dz)
    }
}

/// Fixed spawn point, for tests and scripted placements.
pub struct FixedSpawnLocator(pub Vec3);

impl SpawnLocator for FixedSpawnLocator {
    fn spawn_position(&mut self) -> Vec3 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_spawn_stays_within_scatter_bounds() {
        let mut locator = DeckSpawnLocator::default();
        for _ in 0..32 {
            let pos = locator.spawn_position();
            assert!((pos.x - locator.deck.x).abs() <= locator.scatter);
            assert!((pos.z - locator.deck.z).abs() <= locator.scatter);
            assert_eq!(pos.y, locator.deck.y + locator.lift);
        }
    }
}
