//! Collaborator interfaces. Hosts own these and lend them to the controller
//! per call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ActionClass, CapabilitySet, EntityId, InputTag, TraceChannel, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(pub String);

impl AssetKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorHit {
    pub impact_point: Vec3,
    pub normal: Vec3,
    pub actor: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub class: AssetKey,
    pub amount: f32,
    pub blocked: bool,
    pub critical: bool,
    pub anchor: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

pub trait CapabilityRegistry {
    fn has_blocking_tag(&self, class: ActionClass) -> bool;
}

pub trait NavigationService {
    fn find_path(&self, origin: Vec3, destination: Vec3) -> Option<Vec<Vec3>>;
}

pub trait ActionEngine {
    fn on_input_pressed(&mut self, tag: InputTag);
    fn on_input_released(&mut self, tag: InputTag);
    fn on_input_held(&mut self, tag: InputTag);
}

pub trait EffectHost {
    fn spawn_effect_at(&mut self, effect: &AssetKey, point: Vec3);
    fn spawn_floating_text(&mut self, text: FloatingText);
    fn spawn_marker(&mut self, class: &AssetKey, decal: Option<&AssetKey>) -> MarkerId;
    fn move_marker(&mut self, marker: MarkerId, point: Vec3);
    fn destroy_marker(&mut self, marker: MarkerId) -> bool;
    fn marker_exists(&self, marker: MarkerId) -> bool;
}

/// World entities as seen from the cursor. Every method treats a stale
/// handle as absence.
pub trait ActorWorld {
    fn trace_under_cursor(&self, channel: TraceChannel) -> Option<CursorHit>;
    fn capabilities(&self, actor: EntityId) -> Option<CapabilitySet>;
    fn actor_location(&self, actor: EntityId) -> Option<Vec3>;
    fn set_highlighted(&mut self, actor: EntityId, highlighted: bool) -> bool;
    fn set_move_to_location(&mut self, actor: EntityId, destination: Vec3) -> bool;
}

pub trait Pawn {
    /// `None` while no avatar is possessed.
    fn avatar_location(&self) -> Option<Vec3>;
    fn add_movement_input(&mut self, direction: Vec3);
    fn control_yaw_degrees(&self) -> f32;
    fn add_yaw_input(&mut self, degrees: f32);
    fn add_pitch_input(&mut self, degrees: f32);
    fn jump(&mut self);
    fn stop_jumping(&mut self);
    fn adjust_camera_arm_length(&mut self, delta: f32);
}

pub trait IntentWorld: ActorWorld + Pawn + EffectHost {}

impl<T: ActorWorld + Pawn + EffectHost> IntentWorld for T {}
