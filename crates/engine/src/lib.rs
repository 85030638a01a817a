pub mod arena;
mod capability;
mod input;
mod math;
mod nav;
mod ports;
mod registry;
mod world;

pub use arena::{ArenaError, EntityId};
pub use capability::{ActionClass, Capability, CapabilitySet};
pub use input::{InputTag, TraceChannel, INPUT_TAG_COUNT};
pub use math::{closest_point_on_segment, Vec2, Vec3};
pub use nav::{GridNavigation, NavigationError};
pub use ports::{
    ActionEngine, ActorWorld, AssetKey, CapabilityRegistry, CursorHit, EffectHost,
    FloatingText, IntentWorld, MarkerId, NavigationService, Pawn,
};
pub use registry::TagRegistry;
pub use world::{
    CameraRig, PlacementMarker, SceneWorld, SpawnedEffect, Viewport, WorldEntity,
    CAMERA_ARM_LENGTH_DEFAULT, CAMERA_ARM_LENGTH_MAX, CAMERA_ARM_LENGTH_MIN,
};
