//! Resolves per-frame cursor and input-tag signals into avatar movement or
//! ability input.

mod feedback;
mod gate;
mod highlight;
mod observers;
mod path;
mod probe;
mod router;
mod timer;

#[cfg(test)]
mod tests;

use engine::{
    ActionClass, ActionEngine, AssetKey, Capability, CapabilityRegistry, EntityId, FloatingText,
    InputTag, IntentWorld, MarkerId, NavigationService, Vec3,
};
use tracing::{debug, info};

use crate::config::{ConfigError, ControllerAssets, ControllerConfig};

pub use feedback::DamageNumber;
pub use gate::MissingRegistryPolicy;
pub use highlight::{ActorPointerTriple, TargetingState};
pub use observers::ObserverHandle;
pub use path::PathCache;
pub use probe::CursorProbeResult;
pub use router::InputPhase;

use feedback::PlacementMarkerSlot;
use gate::CapabilityGate;
use observers::TargetObservers;
use router::AbilityRouter;
use timer::HoldTimers;

/// Collaborators lent to the controller for one call. `None` models a
/// collaborator that is not available yet.
pub struct IntentPorts<'a> {
    pub world: &'a mut dyn IntentWorld,
    pub navigation: &'a dyn NavigationService,
    pub capabilities: Option<&'a dyn CapabilityRegistry>,
    pub actions: Option<&'a mut dyn ActionEngine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerRuntimeState {
    pub auto_running: bool,
    pub cached_destination: Vec3,
    pub right_click_held: bool,
    pub shift_held: bool,
    pub targeting: bool,
}

#[derive(Debug)]
pub struct InputIntentController {
    config: ControllerConfig,
    assets: ControllerAssets,
    gate: CapabilityGate,
    router: AbilityRouter,
    cursor: CursorProbeResult,
    pointers: ActorPointerTriple,
    targeting_state: TargetingState,
    runtime: ControllerRuntimeState,
    hold_timers: HoldTimers,
    path: PathCache,
    marker: PlacementMarkerSlot,
    observers: TargetObservers,
}

impl InputIntentController {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        let assets = config.validate()?;
        info!(
            select_tag = config.select_tag.as_token(),
            hold_threshold_seconds = config.hold_threshold_seconds,
            acceptance_radius = config.auto_run_acceptance_radius,
            "input_intent_controller_ready"
        );
        Ok(Self {
            gate: CapabilityGate::new(config.missing_registry_policy),
            router: AbilityRouter::default(),
            cursor: CursorProbeResult::MISS,
            pointers: ActorPointerTriple::default(),
            targeting_state: TargetingState::NotTargeting,
            runtime: ControllerRuntimeState::default(),
            hold_timers: HoldTimers::new(config.hold_threshold_seconds),
            path: PathCache::default(),
            marker: PlacementMarkerSlot::default(),
            observers: TargetObservers::default(),
            assets,
            config,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn runtime(&self) -> &ControllerRuntimeState {
        &self.runtime
    }

    pub fn targeting_state(&self) -> TargetingState {
        self.targeting_state
    }

    pub fn cursor_probe(&self) -> &CursorProbeResult {
        &self.cursor
    }

    pub fn pointers(&self) -> &ActorPointerTriple {
        &self.pointers
    }

    pub fn path(&self) -> &PathCache {
        &self.path
    }

    pub fn hold_elapsed(&self, tag: InputTag) -> f32 {
        self.hold_timers.elapsed(tag)
    }

    pub fn locked_target(&self) -> Option<EntityId> {
        self.pointers.locked
    }

    pub fn subscribe_target_changed(
        &mut self,
        callback: impl FnMut(Option<EntityId>) + 'static,
    ) -> ObserverHandle {
        let handle = self.observers.subscribe(Box::new(callback));
        debug!(subscribers = self.observers.len(), "target_observer_added");
        handle
    }

    pub fn unsubscribe_target_changed(&mut self, handle: ObserverHandle) -> bool {
        self.observers.unsubscribe(handle)
    }

    pub fn set_modifier_held(&mut self, held: bool) {
        self.runtime.shift_held = held;
    }

    pub fn set_secondary_held(&mut self, held: bool) {
        self.runtime.right_click_held = held;
    }

    /// Once per simulation frame, before input events are dispatched.
    pub fn tick(&mut self, ports: &mut IntentPorts<'_>, _dt_seconds: f32) {
        self.drop_stale_locked_target(ports);
        self.trace_cursor(ports);
        if self.cursor.did_hit {
            self.marker.follow(&mut *ports.world, self.cursor.impact_point);
        }
        self.auto_run(ports);
    }

    pub fn on_input_pressed(&mut self, ports: &mut IntentPorts<'_>, tag: InputTag) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::InputPressed) {
            self.reset_after_blocked_event(tag);
            return;
        }
        if tag != self.config.select_tag {
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Pressed, tag);
            return;
        }

        let hovered = highlight::is_live(&*ports.world, self.pointers.current);
        self.targeting_state = highlight::classify(&*ports.world, hovered);
        self.runtime.targeting = self.targeting_state == TargetingState::TargetingEnemy;
        self.runtime.auto_running = false;
        self.hold_timers.reset(tag);
        debug!(state = ?self.targeting_state, hovered = ?hovered, "select_pressed");

        if highlight::is_live(&*ports.world, self.pointers.locked).is_some() {
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Pressed, tag);
        }
    }

    pub fn on_input_released(&mut self, ports: &mut IntentPorts<'_>, tag: InputTag) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::InputReleased) {
            self.reset_after_blocked_event(tag);
            return;
        }
        if tag != self.config.select_tag {
            self.hold_timers.reset(tag);
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Released, tag);
            return;
        }

        if self.is_ability_targeting() {
            self.confirm_ability_target(ports, tag);
        } else if self.hold_timers.is_tap(tag) {
            self.move_to_clicked_point(ports);
        } else {
            debug!(
                held_seconds = self.hold_timers.elapsed(tag),
                threshold = self.hold_timers.threshold(),
                "select_released_after_hold"
            );
        }

        self.hold_timers.reset(tag);
        self.targeting_state = TargetingState::NotTargeting;
        self.runtime.targeting = false;
    }

    pub fn on_input_held(&mut self, ports: &mut IntentPorts<'_>, tag: InputTag, dt_seconds: f32) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::InputHeld) {
            self.reset_after_blocked_event(tag);
            return;
        }
        if tag != self.config.select_tag {
            self.hold_timers.accumulate(tag, dt_seconds);
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Held, tag);
            return;
        }

        if self.is_ability_targeting() {
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Held, tag);
            return;
        }

        self.hold_timers.accumulate(tag, dt_seconds);
        if self.cursor.did_hit {
            self.runtime.cached_destination = self.cursor.impact_point;
        }
        if self.gate.is_blocked(ports.capabilities, ActionClass::Movement) {
            return;
        }
        if let Some(avatar) = ports.world.avatar_location() {
            let direction = (self.runtime.cached_destination - avatar).safe_normal();
            ports.world.add_movement_input(direction);
        }
    }

    pub fn on_move_axis(&mut self, ports: &mut IntentPorts<'_>, right: f32, forward: f32) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::InputPressed)
            || self.gate.is_blocked(ports.capabilities, ActionClass::Movement)
        {
            return;
        }
        let yaw = ports.world.control_yaw_degrees().to_radians();
        let forward_direction = Vec3::new(yaw.cos(), yaw.sin(), 0.0);
        let right_direction = Vec3::new(-yaw.sin(), yaw.cos(), 0.0);
        ports.world.add_movement_input(forward_direction * forward);
        ports.world.add_movement_input(right_direction * right);
    }

    /// Camera look, active only while the secondary button is held.
    pub fn on_look_axis(&mut self, ports: &mut IntentPorts<'_>, yaw: f32, pitch: f32) {
        if !self.runtime.right_click_held {
            return;
        }
        ports.world.add_yaw_input(yaw);
        ports.world.add_pitch_input(pitch);
    }

    pub fn on_jump(&mut self, ports: &mut IntentPorts<'_>) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::InputPressed)
            || self.gate.is_blocked(ports.capabilities, ActionClass::Movement)
        {
            return;
        }
        ports.world.jump();
    }

    pub fn on_stop_jumping(&mut self, ports: &mut IntentPorts<'_>) {
        ports.world.stop_jumping();
    }

    pub fn on_zoom_axis(&mut self, ports: &mut IntentPorts<'_>, axis: f32) {
        if axis == 0.0 || !axis.is_finite() {
            return;
        }
        ports
            .world
            .adjust_camera_arm_length(self.config.camera_zoom_step * axis);
    }

    pub fn show_placement_marker(
        &mut self,
        ports: &mut IntentPorts<'_>,
        decal: Option<&AssetKey>,
    ) -> MarkerId {
        self.marker.show(
            &mut *ports.world,
            &self.assets.placement_marker_class,
            decal,
            self.cursor.impact_point,
        )
    }

    pub fn hide_placement_marker(&mut self, ports: &mut IntentPorts<'_>) -> bool {
        self.marker.hide(&mut *ports.world)
    }

    pub fn is_placement_marker_active(&self, ports: &IntentPorts<'_>) -> bool {
        self.marker.is_active(&*ports.world)
    }

    /// Spawns a floating combat number where the target stands now. Only the
    /// local viewer shows them; stale targets are ignored.
    pub fn show_damage_number(&mut self, ports: &mut IntentPorts<'_>, number: DamageNumber) -> bool {
        if !self.config.is_local_controller {
            return false;
        }
        let Some(anchor) = ports.world.actor_location(number.target) else {
            debug!(actor = %number.target, "damage_number_target_missing");
            return false;
        };
        ports.world.spawn_floating_text(FloatingText {
            class: self.assets.damage_text_class.clone(),
            amount: number.amount,
            blocked: number.blocked,
            critical: number.critical,
            anchor,
        });
        true
    }

    pub fn notify_actor_destroyed(&mut self, actor: EntityId) {
        if self.pointers.locked == Some(actor) {
            self.set_locked_target(None);
        }
    }

    fn is_ability_targeting(&self) -> bool {
        self.targeting_state == TargetingState::TargetingEnemy || self.runtime.shift_held
    }

    fn reset_after_blocked_event(&mut self, tag: InputTag) {
        self.hold_timers.reset(tag);
        if tag == self.config.select_tag {
            self.targeting_state = TargetingState::NotTargeting;
            self.runtime.targeting = false;
        }
    }

    fn drop_stale_locked_target(&mut self, ports: &IntentPorts<'_>) {
        if self.pointers.locked.is_some()
            && highlight::is_live(&*ports.world, self.pointers.locked).is_none()
        {
            info!(actor = ?self.pointers.locked, "locked_target_lost");
            self.set_locked_target(None);
        }
    }

    fn set_locked_target(&mut self, target: Option<EntityId>) {
        if self.pointers.locked == target {
            return;
        }
        self.pointers.locked = target;
        debug!(actor = ?target, "locked_target_changed");
        self.observers.notify(target);
    }

    fn trace_cursor(&mut self, ports: &mut IntentPorts<'_>) {
        if self.gate.is_blocked(ports.capabilities, ActionClass::CursorTrace) {
            highlight::clear_hover(&mut self.pointers, &mut *ports.world);
            self.cursor = CursorProbeResult::MISS;
            return;
        }

        let exclude_avatars = self.marker.is_active(&*ports.world);
        self.cursor = probe::probe(&*ports.world, exclude_avatars);
        if !self.cursor.did_hit {
            return;
        }
        highlight::apply_hit(&mut self.pointers, &mut *ports.world, self.cursor.hit_actor);
    }

    fn auto_run(&mut self, ports: &mut IntentPorts<'_>) {
        if !self.runtime.auto_running {
            return;
        }
        if self.gate.is_blocked(ports.capabilities, ActionClass::Movement) {
            return;
        }
        let Some(avatar) = ports.world.avatar_location() else {
            return;
        };
        let Some(projection) = self.path.project(avatar) else {
            self.runtime.auto_running = false;
            return;
        };
        ports.world.add_movement_input(projection.direction);

        let distance = projection.location.distance(self.runtime.cached_destination);
        if distance <= self.config.auto_run_acceptance_radius {
            self.runtime.auto_running = false;
            debug!(distance, "auto_run_arrived");
        }
    }

    fn confirm_ability_target(&mut self, ports: &mut IntentPorts<'_>, tag: InputTag) {
        let Some(hovered) = highlight::is_live(&*ports.world, self.pointers.current) else {
            return;
        };
        if Some(hovered) != self.pointers.locked {
            self.set_locked_target(Some(hovered));
        } else {
            self.router
                .forward(ports.actions.as_deref_mut(), InputPhase::Held, tag);
        }
    }

    fn move_to_clicked_point(&mut self, ports: &mut IntentPorts<'_>) {
        let Some(avatar) = ports.world.avatar_location() else {
            return;
        };
        if self.cursor.did_hit {
            self.runtime.cached_destination = self.cursor.impact_point;
        }
        let destination = self.runtime.cached_destination;

        let hovered = highlight::is_live(&*ports.world, self.pointers.current);
        let delegate = hovered
            .filter(|_| highlight::supports(&*ports.world, hovered, Capability::SettableDestination));
        if let Some(actor) = delegate {
            ports.world.set_move_to_location(actor, destination);
        } else if !self.gate.is_blocked(ports.capabilities, ActionClass::InputPressed) {
            ports
                .world
                .spawn_effect_at(&self.assets.click_effect, destination);
        }

        let Some(waypoints) = path::plan_path(ports.navigation, avatar, destination) else {
            return;
        };
        self.path.replace(waypoints);
        if let Some(last) = self.path.destination() {
            self.runtime.cached_destination = last;
            self.runtime.auto_running = true;
            debug!(
                waypoints = self.path.waypoints().len(),
                x = last.x,
                y = last.y,
                "auto_run_started"
            );
        }
    }
}
