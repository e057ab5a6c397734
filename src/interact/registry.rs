//! Registry of interactable objects.

use std::collections::BTreeMap;

use glam::Vec3;
use log::trace;

use super::object::{ActiveInteraction, InteractHandler, InteractiveObject, ObjectPatch};

/// Holds every registered interactable, keyed by id. Objects register
/// when their owning world element appears and unregister when it goes
/// away; updates in place are the common case for anything that moves.
#[derive(Default)]
pub struct InteractionRegistry {
    objects: BTreeMap<String, InteractiveObject>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object, replacing any previous registration under the
    /// same id (re-registration on a refresh is routine, not an error).
    pub fn register(&mut self, object: InteractiveObject) {
        trace!("registering interactive object {}", object.id);
        self.objects.insert(object.id.clone(), object);
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.objects.remove(id).is_some()
    }

    /// Apply a partial update to a registered object. Unknown ids are
    /// ignored; the owning element may already be gone.
    pub fn update(&mut self, id: &str, patch: ObjectPatch) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        if let Some(position) = patch.position {
            object.position = position;
        }
        if let Some(radius) = patch.radius {
            object.radius = radius;
        }
        if let Some(key) = patch.interaction_key {
            object.interaction_key = key;
        }
        if let Some(is_interactable) = patch.is_interactable {
            object.is_interactable = is_interactable;
        }
        if let Some(show_prompt) = patch.show_prompt {
            object.show_prompt = show_prompt;
        }
        if let Some(text) = patch.prompt_text {
            object.prompt_text = text;
        }
    }

    pub fn enable(&mut self, id: &str) {
        if let Some(object) = self.objects.get_mut(id) {
            object.is_interactable = true;
        }
    }

    pub fn disable(&mut self, id: &str) {
        if let Some(object) = self.objects.get_mut(id) {
            object.is_interactable = false;
        }
    }

    pub fn move_object(&mut self, id: &str, position: Vec3) {
        if let Some(object) = self.objects.get_mut(id) {
            object.position = position;
        }
    }

    pub fn set_on_interact(&mut self, id: &str, handler: InteractHandler) {
        if let Some(object) = self.objects.get_mut(id) {
            object.on_interact = Some(handler);
        }
    }

    pub fn get(&self, id: &str) -> Option<&InteractiveObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut InteractiveObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractiveObject> {
        self.objects.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.objects.keys()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The on-screen prompt for an in-range pair, if the object wants one.
    pub fn render_prompt(&self, interaction: &ActiveInteraction) -> Option<String> {
        self.objects
            .get(&interaction.object_id)?
            .render_prompt(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::super::object::ObjectKind;
    use super::*;

    #[test]
    fn register_fills_defaults_and_update_patches_in_place() {
        let mut registry = InteractionRegistry::new();
        registry.register(InteractiveObject::new(
            "pad",
            ObjectKind::Custom("pad".into()),
            Vec3::ZERO,
        ));

        let object = registry.get("pad").unwrap();
        assert_eq!(object.radius, 1.0);
        assert_eq!(object.interaction_key, "e");
        assert!(object.is_interactable);
        assert!(object.show_prompt);

        registry.update(
            "pad",
            ObjectPatch {
                radius: Some(4.0),
                position: Some(Vec3::ONE),
                ..Default::default()
            },
        );
        let object = registry.get("pad").unwrap();
        assert_eq!(object.radius, 4.0);
        assert_eq!(object.position, Vec3::ONE);

        // Unknown id: silently ignored.
        registry.update("gone", ObjectPatch::default());
    }

    #[test]
    fn custom_prompt_render_overrides_text() {
        struct Countdown;
        impl super::super::object::PromptRender for Countdown {
            fn prompt(&self, interaction: &ActiveInteraction) -> String {
                format!("{:.0}m to go", interaction.distance)
            }
        }

        let mut registry = InteractionRegistry::new();
        registry.register(
            InteractiveObject::new("a", ObjectKind::Collectible, Vec3::ZERO)
                .with_prompt_render(Box::new(Countdown)),
        );
        registry.register(
            InteractiveObject::new("b", ObjectKind::Collectible, Vec3::ZERO)
                .with_prompt_text("Grab it"),
        );

        let near = ActiveInteraction {
            player_id: "p".into(),
            object_id: "a".into(),
            distance: 3.0,
            player_position: Vec3::ZERO,
            object_position: Vec3::ZERO,
        };
        assert_eq!(registry.render_prompt(&near), Some("3m to go".to_string()));

        let near_b = ActiveInteraction {
            object_id: "b".into(),
            ..near
        };
        assert_eq!(registry.render_prompt(&near_b), Some("Grab it".to_string()));
    }
}
