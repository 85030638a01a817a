use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::{
    ActorWorld, AssetKey, Capability, CapabilitySet, CursorHit, EffectHost, EntityId,
    FloatingText, MarkerId, Pawn, TraceChannel, Vec2, Vec3,
};

pub const CAMERA_ARM_LENGTH_DEFAULT: f32 = 800.0;
pub const CAMERA_ARM_LENGTH_MIN: f32 = 200.0;
pub const CAMERA_ARM_LENGTH_MAX: f32 = 2000.0;
pub const CAMERA_PITCH_MIN_DEGREES: f32 = -80.0;
pub const CAMERA_PITCH_MAX_DEGREES: f32 = -10.0;
const DEFAULT_PIXELS_PER_UNIT: f32 = 0.5;
const DEFAULT_AVATAR_SPEED: f32 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub focus: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub arm_length: f32,
    pub pixels_per_unit: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw_degrees: 0.0,
            pitch_degrees: -45.0,
            arm_length: CAMERA_ARM_LENGTH_DEFAULT,
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
        }
    }
}

impl CameraRig {
    pub fn set_arm_length_clamped(&mut self, arm_length: f32) {
        self.arm_length = clamp_arm_length(arm_length);
    }

    /// Projects a cursor position onto the ground plane (`z = 0`) under an
    /// orthographic top-down view centered on `focus`.
    pub fn screen_to_ground(&self, viewport: Viewport, cursor_px: Vec2) -> Vec3 {
        let scale = self.pixels_per_unit.max(f32::EPSILON);
        Vec3::new(
            self.focus.x + (cursor_px.x - viewport.width as f32 * 0.5) / scale,
            self.focus.y + (viewport.height as f32 * 0.5 - cursor_px.y) / scale,
            0.0,
        )
    }

    pub fn ground_to_screen(&self, viewport: Viewport, world: Vec3) -> Vec2 {
        Vec2::new(
            (world.x - self.focus.x) * self.pixels_per_unit + viewport.width as f32 * 0.5,
            viewport.height as f32 * 0.5 - (world.y - self.focus.y) * self.pixels_per_unit,
        )
    }
}

fn clamp_arm_length(arm_length: f32) -> f32 {
    if !arm_length.is_finite() {
        return CAMERA_ARM_LENGTH_DEFAULT;
    }
    arm_length.clamp(CAMERA_ARM_LENGTH_MIN, CAMERA_ARM_LENGTH_MAX)
}

#[derive(Debug, Clone)]
pub struct WorldEntity {
    pub debug_name: &'static str,
    pub position: Vec3,
    pub pick_radius: f32,
    pub capabilities: CapabilitySet,
    pub highlighted: bool,
    pub move_to_location: Option<Vec3>,
    spawn_order: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedEffect {
    pub effect: AssetKey,
    pub point: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementMarker {
    pub class: AssetKey,
    pub decal: Option<AssetKey>,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AvatarMotion {
    pending_input: Vec3,
    jumping: bool,
}

/// Headless world: entities, one possessed avatar, a camera rig and a record
/// of every effect spawned through [`EffectHost`].
#[derive(Debug)]
pub struct SceneWorld {
    entities: Arena<WorldEntity>,
    next_spawn_order: u64,
    avatar: Option<EntityId>,
    avatar_speed: f32,
    motion: AvatarMotion,
    camera: CameraRig,
    viewport: Viewport,
    cursor_px: Option<Vec2>,
    effects: Vec<SpawnedEffect>,
    floating_texts: Vec<FloatingText>,
    markers: BTreeMap<MarkerId, PlacementMarker>,
    next_marker_id: u64,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            entities: Arena::default(),
            next_spawn_order: 0,
            avatar: None,
            avatar_speed: DEFAULT_AVATAR_SPEED,
            motion: AvatarMotion::default(),
            camera: CameraRig::default(),
            viewport: Viewport::default(),
            cursor_px: None,
            effects: Vec::new(),
            floating_texts: Vec::new(),
            markers: BTreeMap::new(),
            next_marker_id: 0,
        }
    }
}

impl SceneWorld {
    pub fn spawn(
        &mut self,
        debug_name: &'static str,
        position: Vec3,
        pick_radius: f32,
        capabilities: CapabilitySet,
    ) -> EntityId {
        let spawn_order = self.next_spawn_order;
        self.next_spawn_order = self.next_spawn_order.saturating_add(1);
        let id = self.entities.insert(WorldEntity {
            debug_name,
            position,
            pick_radius,
            capabilities,
            highlighted: false,
            move_to_location: None,
            spawn_order,
        });
        debug!(entity = %id, name = debug_name, "entity_spawned");
        id
    }

    pub fn spawn_avatar(&mut self, position: Vec3, pick_radius: f32) -> EntityId {
        let id = self.spawn(
            "avatar",
            position,
            pick_radius,
            CapabilitySet::of(&[Capability::Avatar]),
        );
        self.avatar = Some(id);
        self.camera.focus = position;
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let removed = self.entities.remove(id).is_ok();
        if removed && self.avatar == Some(id) {
            self.avatar = None;
            self.motion = AvatarMotion::default();
        }
        removed
    }

    pub fn entity(&self, id: EntityId) -> Option<&WorldEntity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut WorldEntity> {
        self.entities.get_mut(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn avatar(&self) -> Option<EntityId> {
        self.avatar
    }

    pub fn set_avatar_speed(&mut self, speed: f32) {
        self.avatar_speed = speed.max(0.0);
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_cursor_px(&mut self, cursor_px: Option<Vec2>) {
        self.cursor_px = cursor_px;
    }

    pub fn point_cursor_at(&mut self, world: Vec3) {
        self.cursor_px = Some(self.camera.ground_to_screen(self.viewport, world));
    }

    pub fn pending_movement_input(&self) -> Vec3 {
        self.motion.pending_input
    }

    pub fn is_jumping(&self) -> bool {
        self.motion.jumping
    }

    pub fn spawned_effects(&self) -> &[SpawnedEffect] {
        &self.effects
    }

    pub fn floating_texts(&self) -> &[FloatingText] {
        &self.floating_texts
    }

    pub fn drain_spawned_effects(&mut self) -> Vec<SpawnedEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn drain_floating_texts(&mut self) -> Vec<FloatingText> {
        std::mem::take(&mut self.floating_texts)
    }

    pub fn marker(&self, marker: MarkerId) -> Option<&PlacementMarker> {
        self.markers.get(&marker)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Integrates the movement input accumulated this frame. Input is consumed
    /// whether or not an avatar is possessed.
    pub fn step(&mut self, dt_seconds: f32) {
        let input = std::mem::take(&mut self.motion.pending_input);
        let Some(avatar_id) = self.avatar else {
            return;
        };
        let direction = input.safe_normal();
        let speed = self.avatar_speed;
        let Some(avatar) = self.entities.get_mut(avatar_id) else {
            return;
        };
        avatar.position += direction * (speed * dt_seconds.max(0.0));
        self.camera.focus = avatar.position;
        trace!(x = avatar.position.x, y = avatar.position.y, "avatar_stepped");
    }

    fn pick_topmost_at(&self, point: Vec3, channel: TraceChannel) -> Option<EntityId> {
        let mut best: Option<(u64, EntityId)> = None;
        for (id, entity) in self.entities.iter() {
            if channel == TraceChannel::ExcludeAvatars
                && entity.capabilities.supports(Capability::Avatar)
            {
                continue;
            }
            let dx = entity.position.x - point.x;
            let dy = entity.position.y - point.y;
            if dx * dx + dy * dy > entity.pick_radius * entity.pick_radius {
                continue;
            }
            match best {
                Some((order, _)) if order >= entity.spawn_order => {}
                _ => best = Some((entity.spawn_order, id)),
            }
        }
        best.map(|(_, id)| id)
    }
}

impl ActorWorld for SceneWorld {
    fn trace_under_cursor(&self, channel: TraceChannel) -> Option<CursorHit> {
        let cursor_px = self.cursor_px?;
        let impact_point = self.camera.screen_to_ground(self.viewport, cursor_px);
        Some(CursorHit {
            impact_point,
            normal: Vec3::new(0.0, 0.0, 1.0),
            actor: self.pick_topmost_at(impact_point, channel),
        })
    }

    fn capabilities(&self, actor: EntityId) -> Option<CapabilitySet> {
        self.entities.get(actor).map(|entity| entity.capabilities)
    }

    fn actor_location(&self, actor: EntityId) -> Option<Vec3> {
        self.entities.get(actor).map(|entity| entity.position)
    }

    fn set_highlighted(&mut self, actor: EntityId, highlighted: bool) -> bool {
        let Some(entity) = self.entities.get_mut(actor) else {
            return false;
        };
        entity.highlighted = highlighted;
        true
    }

    fn set_move_to_location(&mut self, actor: EntityId, destination: Vec3) -> bool {
        let Some(entity) = self.entities.get_mut(actor) else {
            return false;
        };
        entity.move_to_location = Some(destination);
        true
    }
}

impl Pawn for SceneWorld {
    fn avatar_location(&self) -> Option<Vec3> {
        self.avatar
            .and_then(|id| self.entities.get(id))
            .map(|entity| entity.position)
    }

    fn add_movement_input(&mut self, direction: Vec3) {
        if self.avatar.is_some() {
            self.motion.pending_input += direction;
        }
    }

    fn control_yaw_degrees(&self) -> f32 {
        self.camera.yaw_degrees
    }

    fn add_yaw_input(&mut self, degrees: f32) {
        self.camera.yaw_degrees = (self.camera.yaw_degrees + degrees).rem_euclid(360.0);
    }

    fn add_pitch_input(&mut self, degrees: f32) {
        self.camera.pitch_degrees = (self.camera.pitch_degrees + degrees)
            .clamp(CAMERA_PITCH_MIN_DEGREES, CAMERA_PITCH_MAX_DEGREES);
    }

    fn jump(&mut self) {
        if self.avatar.is_some() {
            self.motion.jumping = true;
        }
    }

    fn stop_jumping(&mut self) {
        self.motion.jumping = false;
    }

    fn adjust_camera_arm_length(&mut self, delta: f32) {
        let target = self.camera.arm_length + delta;
        self.camera.set_arm_length_clamped(target);
    }
}

impl EffectHost for SceneWorld {
    fn spawn_effect_at(&mut self, effect: &AssetKey, point: Vec3) {
        debug!(effect = %effect, x = point.x, y = point.y, "effect_spawned");
        self.effects.push(SpawnedEffect {
            effect: effect.clone(),
            point,
        });
    }

    fn spawn_floating_text(&mut self, text: FloatingText) {
        debug!(amount = text.amount, critical = text.critical, "floating_text_spawned");
        self.floating_texts.push(text);
    }

    fn spawn_marker(&mut self, class: &AssetKey, decal: Option<&AssetKey>) -> MarkerId {
        let id = MarkerId(self.next_marker_id);
        self.next_marker_id = self.next_marker_id.saturating_add(1);
        self.markers.insert(
            id,
            PlacementMarker {
                class: class.clone(),
                decal: decal.cloned(),
                position: Vec3::ZERO,
            },
        );
        id
    }

    fn move_marker(&mut self, marker: MarkerId, point: Vec3) {
        if let Some(entry) = self.markers.get_mut(&marker) {
            entry.position = point;
        }
    }

    fn destroy_marker(&mut self, marker: MarkerId) -> bool {
        self.markers.remove(&marker).is_some()
    }

    fn marker_exists(&self, marker: MarkerId) -> bool {
        self.markers.contains_key(&marker)
    }
}
