//! Spatial interaction: the registry of interactable objects and the
//! per-tick proximity pass with its enter/exit/trigger lifecycle.

mod object;
mod registry;
mod scheduler;

pub use object::{
    ActiveInteraction, InteractHandler, InteractiveObject, ObjectKind, ObjectPatch, PromptRender,
    DEFAULT_KEY, DEFAULT_PROMPT, DEFAULT_RADIUS,
};
pub use registry::InteractionRegistry;
pub use scheduler::{InteractionEvent, InteractionScheduler, InteractionStats};
