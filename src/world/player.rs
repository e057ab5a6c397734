//! The player table: one entry per connected user, reconciled against the
//! session roster.

use std::collections::BTreeMap;

use glam::Vec3;
use log::trace;

/// One connected user's avatar state.
///
/// Created the moment the user id shows up in the roster, with the avatar
/// unspawned at the origin; removed when the id leaves the roster. The
/// transform is mutated at simulation rate for the local user and at
/// network-delivery rate for remote users.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub user_id: String,
    pub nickname: String,
    pub position: Vec3,
    /// Heading around the world up axis. Avatars only yaw on the wire.
    pub yaw: f32,
    pub is_spawned: bool,
    /// True on exactly one entry per client process: the avatar this
    /// client's input drives.
    pub is_controller: bool,
    /// True when this player's viewpoint drives the render camera. Not
    /// exclusive with the controller flag.
    pub is_camera_owner: bool,
}

impl Player {
    fn joined(user_id: &str, nickname: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            position: Vec3::ZERO,
            yaw: 0.0,
            is_spawned: false,
            is_controller: false,
            is_camera_owner: false,
        }
    }

    /// Full Euler rotation for render code: pitch and roll stay zero.
    pub fn rotation(&self) -> Vec3 {
        Vec3::new(0.0, self.yaw, 0.0)
    }
}

/// In-memory table of players, ordered by the session roster.
///
/// Pure data plus narrow mutators; no networking knowledge. Every mutator
/// tolerates an unknown user id as a silent no-op, because a disconnect and
/// an in-flight mutation for the same id are inherently racy.
#[derive(Default)]
pub struct PlayerTable {
    players: Vec<Player>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the table against the current connected-user roster.
    ///
    /// Adds entries for new ids with default state, refreshes nicknames for
    /// existing ids, and drops entries whose id is gone. Existing player
    /// state survives untouched. Returns whether anything changed, so the
    /// high-frequency transport layer can feed this every frame without
    /// thrashing dependent passes.
    pub fn upsert_from_roster(
        &mut self,
        connected_ids: &[String],
        nicknames: &BTreeMap<String, String>,
    ) -> bool {
        // Unchanged means applying the roster would mutate nothing: same
        // ids in the same order, and no nickname that would overwrite
        // (an absent or empty nickname keeps the existing one).
        let unchanged = self.players.len() == connected_ids.len()
            && self
                .players
                .iter()
                .zip(connected_ids)
                .all(|(player, id)| {
                    let incoming = nicknames.get(id).map(String::as_str).unwrap_or("");
                    player.user_id == *id
                        && (incoming.is_empty() || incoming == player.nickname)
                });
        if unchanged {
            return false;
        }

        let mut previous: BTreeMap<String, Player> = self
            .players
            .drain(..)
            .map(|p| (p.user_id.clone(), p))
            .collect();

        self.players = connected_ids
            .iter()
            .map(|id| {
                let nickname = nicknames.get(id).map(String::as_str).unwrap_or("");
                match previous.remove(id) {
                    Some(mut existing) => {
                        if !nickname.is_empty() {
                            existing.nickname = nickname.to_string();
                        }
                        existing
                    }
                    None => Player::joined(id, nickname),
                }
            })
            .collect();
        true
    }

    pub fn spawn(&mut self, user_id: &str, position: Vec3) {
        let Some(player) = self.get_mut(user_id) else {
            trace!("spawn for unknown player {user_id}, ignoring");
            return;
        };
        player.is_spawned = true;
        player.position = position;
    }

    pub fn despawn(&mut self, user_id: &str) {
        let Some(player) = self.get_mut(user_id) else {
            trace!("despawn for unknown player {user_id}, ignoring");
            return;
        };
        player.is_spawned = false;
    }

    pub fn set_position(&mut self, user_id: &str, position: Vec3) {
        if let Some(player) = self.get_mut(user_id) {
            player.position = position;
        }
    }

    pub fn set_yaw(&mut self, user_id: &str, yaw: f32) {
        if let Some(player) = self.get_mut(user_id) {
            player.yaw = yaw;
        }
    }

    /// Set or clear the local-input flag. Granting it to one player clears
    /// it on every other entry in the same call, so at most one controller
    /// can exist per process no matter the call order.
    pub fn set_controller(&mut self, user_id: &str, is_controller: bool) {
        for player in &mut self.players {
            player.is_controller = is_controller && player.user_id == user_id;
        }
    }

    pub fn set_camera_owner(&mut self, user_id: &str, is_camera_owner: bool) {
        if let Some(player) = self.get_mut(user_id) {
            player.is_camera_owner = is_camera_owner;
        }
    }

    pub fn get(&self, user_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn get_mut(&mut self, user_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn controller(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_controller)
    }

    pub fn all_spawned(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_spawned)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
