use engine::{ActionEngine, InputTag};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPhase {
    Pressed,
    Released,
    Held,
}

#[derive(Debug, Default)]
pub(crate) struct AbilityRouter {
    warned_missing_engine: bool,
}

impl AbilityRouter {
    /// Returns `false` when no action engine is attached.
    pub(crate) fn forward<E: ActionEngine + ?Sized>(
        &mut self,
        engine: Option<&mut E>,
        phase: InputPhase,
        tag: InputTag,
    ) -> bool {
        let Some(engine) = engine else {
            if !self.warned_missing_engine {
                self.warned_missing_engine = true;
                warn!(tag = tag.as_token(), ?phase, "action_engine_missing");
            }
            return false;
        };
        trace!(tag = tag.as_token(), ?phase, "ability_input_forwarded");
        match phase {
            InputPhase::Pressed => engine.on_input_pressed(tag),
            InputPhase::Released => engine.on_input_released(tag),
            InputPhase::Held => engine.on_input_held(tag),
        }
        true
    }
}
