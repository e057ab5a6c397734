//! Interactive object configuration.

use glam::Vec3;

/// Default interaction radius for objects registered without one.
pub const DEFAULT_RADIUS: f32 = 1.0;
/// Default key binding for objects registered without one.
pub const DEFAULT_KEY: &str = "e";
/// Default prompt shown while a player is in range.
pub const DEFAULT_PROMPT: &str = "Press E to interact";

/// What an interactive object is, as a closed set of behaviors instead of
/// a free-form tag plus metadata bag. The engine itself acts on the
/// vehicle variants; the rest exist for the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// Boarding zone around an unpiloted vehicle.
    VehicleEntrance { vehicle_id: String },
    /// Pad that spawns a fresh vehicle nearby when used.
    VehicleSpawner,
    /// Pickup the embedder collects via the event stream.
    Collectible,
    /// Embedder-defined behavior, grouped by tag.
    Custom(String),
}

/// A (player, object) pair currently in range, recomputed every tick and
/// never persisted. Positions are snapshots from evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveInteraction {
    pub player_id: String,
    pub object_id: String,
    pub distance: f32,
    pub player_position: Vec3,
    pub object_position: Vec3,
}

/// Callback attached to an object's enter/exit/use transitions.
pub type InteractHandler = Box<dyn FnMut(&ActiveInteraction)>;

/// Capability for objects that draw their own on-screen affordance
/// instead of the default text prompt. Selected through the registry at
/// render time; the scheduler is agnostic to visualization.
pub trait PromptRender {
    fn prompt(&self, interaction: &ActiveInteraction) -> String;
}

/// A registered interactable. World-fixed or dynamic; position, radius,
/// and handlers may all change while registered.
pub struct InteractiveObject {
    pub id: String,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub radius: f32,
    pub interaction_key: String,
    pub is_interactable: bool,
    pub show_prompt: bool,
    pub prompt_text: String,
    pub on_enter: Option<InteractHandler>,
    pub on_exit: Option<InteractHandler>,
    pub on_interact: Option<InteractHandler>,
    pub prompt: Option<Box<dyn PromptRender>>,
}

impl InteractiveObject {
    /// Build an object with defaults filled in for everything optional.
    pub fn new(id: impl Into<String>, kind: ObjectKind, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            radius: DEFAULT_RADIUS,
            interaction_key: DEFAULT_KEY.to_string(),
            is_interactable: true,
            show_prompt: true,
            prompt_text: DEFAULT_PROMPT.to_string(),
            on_enter: None,
            on_exit: None,
            on_interact: None,
            prompt: None,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.interaction_key = key.into();
        self
    }

    pub fn with_prompt_text(mut self, text: impl Into<String>) -> Self {
        self.prompt_text = text.into();
        self
    }

    pub fn interactable(mut self, is_interactable: bool) -> Self {
        self.is_interactable = is_interactable;
        self
    }

    pub fn on_enter(mut self, handler: impl FnMut(&ActiveInteraction) + 'static) -> Self {
        self.on_enter = Some(Box::new(handler));
        self
    }

    pub fn on_exit(mut self, handler: impl FnMut(&ActiveInteraction) + 'static) -> Self {
        self.on_exit = Some(Box::new(handler));
        self
    }

    pub fn on_interact(mut self, handler: impl FnMut(&ActiveInteraction) + 'static) -> Self {
        self.on_interact = Some(Box::new(handler));
        self
    }

    pub fn with_prompt_render(mut self, prompt: Box<dyn PromptRender>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// The affordance text for an in-range pair, or None when the object
    /// hides its prompt.
    pub fn render_prompt(&self, interaction: &ActiveInteraction) -> Option<String> {
        if !self.show_prompt {
            return None;
        }
        match &self.prompt {
            Some(custom) => Some(custom.prompt(interaction)),
            None => Some(self.prompt_text.clone()),
        }
    }
}

/// A partial update applied to a registered object in place. Handlers are
/// replaced through their dedicated setters on the registry, not here.
#[derive(Default)]
pub struct ObjectPatch {
    pub position: Option<Vec3>,
    pub radius: Option<f32>,
    pub interaction_key: Option<String>,
    pub is_interactable: Option<bool>,
    pub show_prompt: Option<bool>,
    pub prompt_text: Option<String>,
}
