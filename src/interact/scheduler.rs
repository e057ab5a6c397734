//! Per-tick proximity pass and key-press dispatch.
//!
//! Once per simulation tick the scheduler recomputes the exact set of
//! (player, object) pairs in range and fires enter/exit callbacks on the
//! transitions. Key presses are dispatched from the embedder's discrete
//! key-down event, never from polled key state, so holding a key for
//! forty frames uses an object once, not forty times.

use crate::world::PlayerTable;

use super::object::{ActiveInteraction, ObjectKind};
use super::registry::InteractionRegistry;

/// A transition or dispatch surfaced to the embedder. Drained once per
/// frame; callbacks on the objects fire in addition to these.
#[derive(Debug, Clone)]
pub enum InteractionEvent {
    Entered(ActiveInteraction),
    Exited(ActiveInteraction),
    Triggered {
        interaction: ActiveInteraction,
        kind: ObjectKind,
    },
}

/// Aggregate counters for debug overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionStats {
    pub total_objects: usize,
    pub interactable_objects: usize,
    pub active_pairs: usize,
    pub players_with_interactions: usize,
}

#[derive(Default)]
pub struct InteractionScheduler {
    active: Vec<ActiveInteraction>,
    events: Vec<InteractionEvent>,
}

impl InteractionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the active set and fire lifecycle transitions.
    ///
    /// A pair is active iff the object is interactable, the player is
    /// spawned, and the distance is within the radius (the boundary
    /// itself counts as in range). Pairs active in both ticks fire
    /// nothing. O(players x objects); both counts are tens, not
    /// thousands, so no spatial index is warranted yet.
    pub fn tick(&mut self, players: &PlayerTable, registry: &mut InteractionRegistry) {
        let mut next: Vec<ActiveInteraction> = Vec::new();
        for player in players.all_spawned() {
            for object in registry.iter() {
                if !object.is_interactable {
                    continue;
                }
                let distance = player.position.distance(object.position);
                if distance <= object.radius {
                    next.push(ActiveInteraction {
                        player_id: player.user_id.clone(),
                        object_id: object.id.clone(),
                        distance,
                        player_position: player.position,
                        object_position: object.position,
                    });
                }
            }
        }

        let entered: Vec<ActiveInteraction> = next
            .iter()
            .filter(|pair| !contains_pair(&self.active, pair))
            .cloned()
            .collect();
        let exited: Vec<ActiveInteraction> = self
            .active
            .iter()
            .filter(|pair| !contains_pair(&next, pair))
            .cloned()
            .collect();

        for interaction in entered {
            if let Some(object) = registry.get_mut(&interaction.object_id) {
                if let Some(handler) = object.on_enter.as_mut() {
                    handler(&interaction);
                }
            }
            self.events.push(InteractionEvent::Entered(interaction));
        }
        for interaction in exited {
            if let Some(object) = registry.get_mut(&interaction.object_id) {
                if let Some(handler) = object.on_exit.as_mut() {
                    handler(&interaction);
                }
            }
            self.events.push(InteractionEvent::Exited(interaction));
        }

        self.active = next;
    }

    /// Dispatch a key press for one player. Called once per physical
    /// key-down event. Fires `on_interact` for every active pair of the
    /// player whose binding matches the key case-insensitively, and
    /// returns the fired pairs with their object kinds.
    pub fn trigger(
        &mut self,
        registry: &mut InteractionRegistry,
        player_id: &str,
        key: &str,
    ) -> Vec<(ActiveInteraction, ObjectKind)> {
        let mut fired = Vec::new();
        for interaction in &self.active {
            if interaction.player_id != player_id {
                continue;
            }
            let Some(object) = registry.get_mut(&interaction.object_id) else {
                continue;
            };
            if !object.is_interactable
                || !object.interaction_key.eq_ignore_ascii_case(key)
            {
                continue;
            }
            if let Some(handler) = object.on_interact.as_mut() {
                handler(interaction);
            }
            fired.push((interaction.clone(), object.kind.clone()));
        }
        for (interaction, kind) in &fired {
            self.events.push(InteractionEvent::Triggered {
                interaction: interaction.clone(),
                kind: kind.clone(),
            });
        }
        fired
    }

    pub fn active(&self) -> &[ActiveInteraction] {
        &self.active
    }

    pub fn for_player<'a>(
        &'a self,
        player_id: &'a str,
    ) -> impl Iterator<Item = &'a ActiveInteraction> {
        self.active.iter().filter(move |i| i.player_id == player_id)
    }

    pub fn for_object<'a>(
        &'a self,
        object_id: &'a str,
    ) -> impl Iterator<Item = &'a ActiveInteraction> {
        self.active.iter().filter(move |i| i.object_id == object_id)
    }

    /// Take the transitions and dispatches queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forget the active set without firing exits. Used on teardown.
    pub fn clear(&mut self) {
        self.active.clear();
        self.events.clear();
    }

    pub fn stats(&self, registry: &InteractionRegistry) -> InteractionStats {
        let mut players: Vec<&str> = self.active.iter().map(|i| i.player_id.as_str()).collect();
        players.sort_unstable();
        players.dedup();
        InteractionStats {
            total_objects: registry.len(),
            interactable_objects: registry.iter().filter(|o| o.is_interactable).count(),
            active_pairs: self.active.len(),
            players_with_interactions: players.len(),
        }
    }
}

fn contains_pair(set: &[ActiveInteraction], pair: &ActiveInteraction) -> bool {
    set.iter()
        .any(|i| i.player_id == pair.player_id && i.object_id == pair.object_id)
}
