//! Relay key naming for synced state.

/// The single shared key holding the whole vehicle list.
pub const VEHICLES_KEY: &str = "ships";

pub fn player_position_key(user_id: &str) -> String {
    format!("player_{user_id}")
}

pub fn player_yaw_key(user_id: &str) -> String {
    format!("player_rotation_{user_id}")
}

pub fn player_spawned_key(user_id: &str) -> String {
    format!("player_spawned_{user_id}")
}

/// A parsed relay key, used to route an inbound update to its bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncKey {
    Position { user_id: String },
    Yaw { user_id: String },
    Spawned { user_id: String },
    Vehicles,
}

impl SyncKey {
    /// Classify a relay key. Keys the engine does not own (chat, session
    /// metadata, embedder state) return None and are left alone.
    ///
    /// The longer `player_rotation_` / `player_spawned_` prefixes are
    /// checked before the bare `player_` prefix.
    pub fn parse(key: &str) -> Option<SyncKey> {
        if key == VEHICLES_KEY {
            return Some(SyncKey::Vehicles);
        }
        if let Some(user_id) = key.strip_prefix("player_rotation_") {
            return Some(SyncKey::Yaw {
                user_id: user_id.to_string(),
            });
        }
        if let Some(user_id) = key.strip_prefix("player_spawned_") {
            return Some(SyncKey::Spawned {
                user_id: user_id.to_string(),
            });
        }
        if let Some(user_id) = key.strip_prefix("player_") {
            return Some(SyncKey::Position {
                user_id: user_id.to_string(),
            });
        }
        None
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            SyncKey::Position { user_id }
            | SyncKey::Yaw { user_id }
            | SyncKey::Spawned { user_id } => Some(user_id),
            SyncKey::Vehicles => None,
        }
    }
}
