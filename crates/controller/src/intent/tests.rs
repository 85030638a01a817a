use std::cell::RefCell;
use std::rc::Rc;

use engine::{
    ActionClass, ActionEngine, ActorWorld, AssetKey, Capability, CapabilityRegistry,
    CapabilitySet, CursorHit, EffectHost, EntityId, FloatingText, GridNavigation, InputTag,
    MarkerId, NavigationService, Pawn, SceneWorld, TagRegistry, TraceChannel, Vec3,
    CAMERA_ARM_LENGTH_DEFAULT, CAMERA_ARM_LENGTH_MAX,
};

use super::*;
use crate::config::{ConfigError, ControllerConfig};

const FRAME: f32 = 0.1;

fn assert_vec3_close(actual: Vec3, expected: Vec3) {
    assert!(
        actual.distance(expected) <= 1e-3,
        "expected {expected:?}, got {actual:?}"
    );
}

fn test_config() -> ControllerConfig {
    ControllerConfig {
        click_effect: Some(AssetKey::new("fx.click_marker")),
        damage_text_class: Some(AssetKey::new("ui.damage_text")),
        placement_marker_class: Some(AssetKey::new("fx.magic_circle")),
        ..ControllerConfig::default()
    }
}

fn enemy_caps() -> CapabilitySet {
    CapabilitySet::of(&[Capability::Highlightable, Capability::Actionable])
}

struct RecordingNavigation {
    grid: GridNavigation,
    queries: RefCell<Vec<(Vec3, Vec3)>>,
    fail: bool,
}

impl NavigationService for RecordingNavigation {
    fn find_path(&self, origin: Vec3, destination: Vec3) -> Option<Vec<Vec3>> {
        self.queries.borrow_mut().push((origin, destination));
        if self.fail {
            return None;
        }
        self.grid.find_path(origin, destination)
    }
}

#[derive(Default)]
struct RecordingActions {
    events: Vec<(InputPhase, InputTag)>,
}

impl RecordingActions {
    fn count(&self, phase: InputPhase) -> usize {
        self.events.iter().filter(|(seen, _)| *seen == phase).count()
    }
}

impl ActionEngine for RecordingActions {
    fn on_input_pressed(&mut self, tag: InputTag) {
        self.events.push((InputPhase::Pressed, tag));
    }

    fn on_input_released(&mut self, tag: InputTag) {
        self.events.push((InputPhase::Released, tag));
    }

    fn on_input_held(&mut self, tag: InputTag) {
        self.events.push((InputPhase::Held, tag));
    }
}

struct Harness {
    world: SceneWorld,
    navigation: RecordingNavigation,
    registry: TagRegistry,
    actions: RecordingActions,
    controller: InputIntentController,
    attach_registry: bool,
    attach_actions: bool,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(test_config())
    }

    fn with_config(config: ControllerConfig) -> Self {
        let mut world = SceneWorld::default();
        world.spawn_avatar(Vec3::ZERO, 30.0);
        let grid = GridNavigation::open(20, 20, Vec3::new(-1000.0, -1000.0, 0.0), 100.0)
            .expect("grid");
        Self {
            world,
            navigation: RecordingNavigation {
                grid,
                queries: RefCell::new(Vec::new()),
                fail: false,
            },
            registry: TagRegistry::default(),
            actions: RecordingActions::default(),
            controller: InputIntentController::new(config).expect("controller"),
            attach_registry: true,
            attach_actions: true,
        }
    }

    fn with_ports<R>(
        &mut self,
        f: impl FnOnce(&mut InputIntentController, &mut IntentPorts<'_>) -> R,
    ) -> R {
        let Self {
            world,
            navigation,
            registry,
            actions,
            controller,
            attach_registry,
            attach_actions,
        } = self;
        let capabilities: Option<&dyn CapabilityRegistry> = if *attach_registry {
            Some(&*registry)
        } else {
            None
        };
        let actions: Option<&mut dyn ActionEngine> = if *attach_actions {
            Some(actions)
        } else {
            None
        };
        let mut ports = IntentPorts {
            world,
            navigation: &*navigation,
            capabilities,
            actions,
        };
        f(controller, &mut ports)
    }

    fn tick(&mut self) {
        self.with_ports(|controller, ports| controller.tick(ports, FRAME));
    }

    fn press(&mut self, tag: InputTag) {
        self.with_ports(|controller, ports| controller.on_input_pressed(ports, tag));
    }

    fn hold(&mut self, tag: InputTag, dt: f32) {
        self.with_ports(|controller, ports| controller.on_input_held(ports, tag, dt));
    }

    fn release(&mut self, tag: InputTag) {
        self.with_ports(|controller, ports| controller.on_input_released(ports, tag));
    }

    fn point_at(&mut self, point: Vec3) {
        self.world.point_cursor_at(point);
        self.tick();
    }

    /// Press, hold for `frames` frames of `dt`, then release on the select tag.
    fn click(&mut self, frames: usize, dt: f32) {
        self.press(InputTag::Lmb);
        for _ in 0..frames {
            self.tick();
            self.hold(InputTag::Lmb, dt);
        }
        self.tick();
        self.release(InputTag::Lmb);
    }

    fn query_count(&self) -> usize {
        self.navigation.queries.borrow().len()
    }

    fn lock_onto(&mut self, actor_position: Vec3) {
        self.point_at(actor_position);
        self.press(InputTag::Lmb);
        self.release(InputTag::Lmb);
    }
}

#[test]
fn new_rejects_missing_asset_reference() {
    let config = ControllerConfig {
        click_effect: None,
        ..test_config()
    };
    let err = InputIntentController::new(config).expect_err("missing click effect");
    assert!(matches!(
        err,
        ConfigError::MissingReference {
            field: "click_effect"
        }
    ));
}

#[test]
fn short_tap_on_ground_spawns_marker_and_starts_auto_run() {
    let mut harness = Harness::new();
    let target = Vec3::new(300.0, 0.0, 0.0);
    harness.point_at(target);

    harness.press(InputTag::Lmb);
    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
    for _ in 0..2 {
        harness.tick();
        harness.hold(InputTag::Lmb, FRAME);
    }
    harness.tick();
    harness.release(InputTag::Lmb);

    let effects = harness.world.spawned_effects();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].effect, AssetKey::new("fx.click_marker"));
    assert_vec3_close(effects[0].point, target);

    assert_eq!(harness.query_count(), 1);
    let path = harness.controller.path();
    assert!(!path.is_empty());
    let runtime = harness.controller.runtime();
    assert_eq!(Some(runtime.cached_destination), path.destination());
    assert_vec3_close(runtime.cached_destination, target);
    assert!(runtime.auto_running);
    assert!(!runtime.targeting);
    assert_eq!(harness.controller.hold_elapsed(InputTag::Lmb), 0.0);
    assert!(harness.actions.events.is_empty());
}

#[test]
fn release_exactly_at_threshold_counts_as_tap() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 100.0, 0.0));
    harness.click(2, 0.25);
    assert_eq!(harness.query_count(), 1);
    assert!(harness.controller.runtime().auto_running);
}

#[test]
fn release_after_threshold_issues_no_path_query() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 100.0, 0.0));
    harness.click(3, 0.25);

    assert_eq!(harness.query_count(), 0);
    assert!(harness.world.spawned_effects().is_empty());
    assert!(!harness.controller.runtime().auto_running);
    assert_eq!(harness.controller.hold_elapsed(InputTag::Lmb), 0.0);
    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
}

#[test]
fn hold_on_ground_walks_toward_cursor_without_pathing() {
    let mut harness = Harness::new();
    let target = Vec3::new(0.0, 400.0, 0.0);
    harness.point_at(target);
    harness.press(InputTag::Lmb);
    harness.tick();
    harness.hold(InputTag::Lmb, FRAME);

    assert_vec3_close(harness.world.pending_movement_input(), Vec3::new(0.0, 1.0, 0.0));
    assert_vec3_close(harness.controller.runtime().cached_destination, target);
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn auto_run_stops_inside_acceptance_radius_and_stays_stopped() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(1, FRAME);
    assert!(harness.controller.runtime().auto_running);

    let mut frames = 0;
    loop {
        assert!(frames < 20, "auto-run never arrived");
        harness.tick();
        if !harness.controller.runtime().auto_running {
            break;
        }
        harness.world.step(FRAME);
        frames += 1;
    }

    let avatar = harness.world.avatar_location().expect("avatar");
    let destination = harness.controller.runtime().cached_destination;
    assert!(avatar.distance(destination) <= 50.0 + 1e-3);
    harness.world.step(0.0);

    for _ in 0..5 {
        harness.tick();
        assert!(!harness.controller.runtime().auto_running);
        assert_eq!(harness.world.pending_movement_input(), Vec3::ZERO);
    }
    assert_eq!(harness.query_count(), 1);
}

#[test]
fn auto_run_steers_along_path_tangent() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(500.0, 0.0, 0.0));
    harness.click(0, FRAME);

    harness.tick();
    assert_vec3_close(harness.world.pending_movement_input(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn failed_path_query_keeps_prior_path() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);
    let prior = harness.controller.path().clone();
    assert!(!prior.is_empty());

    harness.navigation.fail = true;
    harness.point_at(Vec3::new(-300.0, 200.0, 0.0));
    harness.click(0, FRAME);

    assert_eq!(harness.query_count(), 2);
    assert_eq!(harness.controller.path(), &prior);
    assert!(!harness.controller.runtime().auto_running);
}

#[test]
fn enemy_hold_forwards_held_every_tick_without_moving() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    harness.point_at(enemy_at);

    harness.press(InputTag::Lmb);
    assert_eq!(harness.controller.targeting_state(), TargetingState::TargetingEnemy);
    assert!(harness.controller.runtime().targeting);

    for _ in 0..10 {
        harness.tick();
        harness.hold(InputTag::Lmb, FRAME);
    }

    assert_eq!(harness.actions.count(InputPhase::Held), 10);
    assert_eq!(harness.world.pending_movement_input(), Vec3::ZERO);
    assert_eq!(harness.controller.hold_elapsed(InputTag::Lmb), 0.0);
    assert_eq!(harness.query_count(), 0);
    assert!(harness.world.spawned_effects().is_empty());
}

#[test]
fn enemy_release_promotes_then_confirms_locked_target() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    harness
        .controller
        .subscribe_target_changed(move |target| sink.borrow_mut().push(target));

    harness.lock_onto(enemy_at);
    assert_eq!(harness.controller.locked_target(), Some(enemy));
    assert_eq!(*seen.borrow(), vec![Some(enemy)]);
    assert!(harness.actions.events.is_empty());
    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
    assert!(!harness.controller.runtime().targeting);

    harness.press(InputTag::Lmb);
    harness.release(InputTag::Lmb);
    assert_eq!(
        harness.actions.events,
        vec![
            (InputPhase::Pressed, InputTag::Lmb),
            (InputPhase::Held, InputTag::Lmb)
        ]
    );
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn modifier_turns_release_into_targeting_confirmation() {
    let mut harness = Harness::new();
    let npc_at = Vec3::new(-200.0, 0.0, 0.0);
    let npc = harness.world.spawn(
        "villager",
        npc_at,
        40.0,
        CapabilitySet::of(&[Capability::Highlightable]),
    );
    harness.point_at(npc_at);
    harness.controller.set_modifier_held(true);

    harness.press(InputTag::Lmb);
    assert_eq!(harness.controller.targeting_state(), TargetingState::TargetingNonEnemy);
    harness.release(InputTag::Lmb);

    assert_eq!(harness.controller.locked_target(), Some(npc));
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn locked_target_death_clears_target_and_notifies() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    harness
        .controller
        .subscribe_target_changed(move |target| sink.borrow_mut().push(target));
    harness.lock_onto(enemy_at);

    assert!(harness.world.despawn(enemy));
    harness.tick();

    assert_eq!(harness.controller.locked_target(), None);
    assert_eq!(*seen.borrow(), vec![Some(enemy), None]);
    assert_eq!(harness.controller.pointers().current, None);
}

#[test]
fn notify_actor_destroyed_clears_only_matching_lock() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    let other = harness
        .world
        .spawn("other", Vec3::new(-400.0, 0.0, 0.0), 40.0, enemy_caps());
    harness.lock_onto(enemy_at);

    harness.controller.notify_actor_destroyed(other);
    assert_eq!(harness.controller.locked_target(), Some(enemy));
    harness.controller.notify_actor_destroyed(enemy);
    assert_eq!(harness.controller.locked_target(), None);
}

#[test]
fn unsubscribed_observer_is_not_called() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    let calls = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&calls);
    let handle = harness
        .controller
        .subscribe_target_changed(move |_| *sink.borrow_mut() += 1);
    assert!(harness.controller.unsubscribe_target_changed(handle));
    assert!(!harness.controller.unsubscribe_target_changed(handle));

    harness.lock_onto(enemy_at);
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn tap_on_settable_actor_delegates_destination() {
    let mut harness = Harness::new();
    let npc_at = Vec3::new(0.0, 300.0, 0.0);
    let npc = harness.world.spawn(
        "follower",
        npc_at,
        40.0,
        CapabilitySet::of(&[Capability::Highlightable, Capability::SettableDestination]),
    );
    harness.point_at(npc_at);
    harness.press(InputTag::Lmb);
    assert_eq!(harness.controller.targeting_state(), TargetingState::TargetingNonEnemy);
    harness.release(InputTag::Lmb);

    let delegated = harness
        .world
        .entity(npc)
        .and_then(|entity| entity.move_to_location)
        .expect("destination delegated");
    assert_vec3_close(delegated, npc_at);
    assert!(harness.world.spawned_effects().is_empty());
    assert_eq!(harness.query_count(), 1);
}

#[test]
fn press_cancels_auto_run() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);
    assert!(harness.controller.runtime().auto_running);

    harness.press(InputTag::Lmb);
    assert!(!harness.controller.runtime().auto_running);
}

#[test]
fn hovering_highlights_on_change_only() {
    let mut harness = Harness::new();
    let first_at = Vec3::new(200.0, 0.0, 0.0);
    let second_at = Vec3::new(-200.0, 0.0, 0.0);
    let first = harness.world.spawn("first", first_at, 40.0, enemy_caps());
    let second = harness.world.spawn("second", second_at, 40.0, enemy_caps());

    harness.point_at(first_at);
    assert!(harness.world.entity(first).expect("first").highlighted);
    assert_eq!(harness.controller.pointers().current, Some(first));

    harness.point_at(second_at);
    assert!(!harness.world.entity(first).expect("first").highlighted);
    assert!(harness.world.entity(second).expect("second").highlighted);
    assert_eq!(harness.controller.pointers().previous, Some(first));
    assert_eq!(harness.controller.pointers().current, Some(second));

    harness.point_at(Vec3::new(0.0, -300.0, 0.0));
    assert!(!harness.world.entity(second).expect("second").highlighted);
    assert_eq!(harness.controller.pointers().current, None);
}

#[test]
fn non_highlightable_actor_counts_as_no_actor() {
    let mut harness = Harness::new();
    let rock_at = Vec3::new(200.0, 0.0, 0.0);
    let rock = harness.world.spawn(
        "rock",
        rock_at,
        40.0,
        CapabilitySet::of(&[Capability::Actionable]),
    );
    harness.point_at(rock_at);

    assert_eq!(harness.controller.cursor_probe().hit_actor, Some(rock));
    assert_eq!(harness.controller.pointers().current, None);
    harness.press(InputTag::Lmb);
    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
}

#[test]
fn press_on_despawned_hovered_enemy_is_not_targeting() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    harness.point_at(enemy_at);
    assert_eq!(harness.controller.pointers().current, Some(enemy));

    assert!(harness.world.despawn(enemy));
    harness.press(InputTag::Lmb);

    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
    assert!(!harness.controller.runtime().targeting);
    assert!(harness.actions.events.is_empty());
}

#[test]
fn tap_on_despawned_settable_actor_spawns_click_marker() {
    let mut harness = Harness::new();
    let npc_at = Vec3::new(0.0, 300.0, 0.0);
    let npc = harness.world.spawn(
        "follower",
        npc_at,
        40.0,
        CapabilitySet::of(&[Capability::Highlightable, Capability::SettableDestination]),
    );
    harness.point_at(npc_at);
    harness.press(InputTag::Lmb);
    assert!(harness.world.despawn(npc));
    harness.release(InputTag::Lmb);

    let effects = harness.world.spawned_effects();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].effect, AssetKey::new("fx.click_marker"));
    assert_vec3_close(effects[0].point, npc_at);
    assert_eq!(harness.query_count(), 1);
    assert!(harness.controller.runtime().auto_running);
    assert!(harness.world.entity(npc).is_none());
}

#[test]
fn cursor_trace_block_clears_highlight_and_skips_probe() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    harness.point_at(enemy_at);
    assert!(harness.world.entity(enemy).expect("enemy").highlighted);

    harness.registry.add_blocking(ActionClass::CursorTrace);
    harness.tick();

    assert!(!harness.world.entity(enemy).expect("enemy").highlighted);
    let pointers = harness.controller.pointers();
    assert_eq!(pointers.current, None);
    assert_eq!(pointers.previous, None);
    assert!(!harness.controller.cursor_probe().did_hit);

    harness.registry.remove_blocking(ActionClass::CursorTrace);
    harness.tick();
    assert!(harness.world.entity(enemy).expect("enemy").highlighted);
}

#[test]
fn blocked_hold_resets_timer_and_targeting() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    harness.point_at(enemy_at);
    harness.press(InputTag::Lmb);
    assert!(harness.controller.runtime().targeting);

    harness.registry.add_blocking(ActionClass::InputHeld);
    harness.hold(InputTag::Lmb, FRAME);

    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
    assert!(!harness.controller.runtime().targeting);
    assert!(harness.actions.events.is_empty());
}

#[test]
fn blocked_press_is_ignored() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);
    harness.registry.add_blocking(ActionClass::InputPressed);

    harness.press(InputTag::Lmb);
    harness.press(InputTag::Key1);

    assert!(harness.controller.runtime().auto_running);
    assert!(harness.actions.events.is_empty());
}

#[test]
fn blocked_release_skips_tap() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.press(InputTag::Lmb);
    harness.registry.add_blocking(ActionClass::InputReleased);
    harness.release(InputTag::Lmb);
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn input_pressed_block_suppresses_click_marker_but_not_move() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.press(InputTag::Lmb);
    harness.registry.add_blocking(ActionClass::InputPressed);
    harness.release(InputTag::Lmb);

    assert!(harness.world.spawned_effects().is_empty());
    assert_eq!(harness.query_count(), 1);
    assert!(harness.controller.runtime().auto_running);
}

#[test]
fn movement_block_pauses_steering_but_keeps_latch() {
    let mut harness = Harness::new();
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);

    harness.registry.add_blocking(ActionClass::Movement);
    harness.tick();
    assert_eq!(harness.world.pending_movement_input(), Vec3::ZERO);
    assert!(harness.controller.runtime().auto_running);

    harness.press(InputTag::Lmb);
    harness.hold(InputTag::Lmb, FRAME);
    assert_eq!(harness.world.pending_movement_input(), Vec3::ZERO);

    harness.registry.remove_blocking(ActionClass::Movement);
    harness.hold(InputTag::Lmb, FRAME);
    assert_ne!(harness.world.pending_movement_input(), Vec3::ZERO);
}

#[test]
fn other_tags_route_straight_to_action_engine() {
    let mut harness = Harness::new();
    harness.press(InputTag::Key2);
    harness.hold(InputTag::Key2, FRAME);
    harness.release(InputTag::Key2);

    assert_eq!(
        harness.actions.events,
        vec![
            (InputPhase::Pressed, InputTag::Key2),
            (InputPhase::Held, InputTag::Key2),
            (InputPhase::Released, InputTag::Key2)
        ]
    );
    assert_eq!(harness.controller.targeting_state(), TargetingState::NotTargeting);
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn missing_collaborators_fail_open() {
    let mut harness = Harness::new();
    harness.attach_registry = false;
    harness.attach_actions = false;
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));

    harness.press(InputTag::Key1);
    harness.click(1, FRAME);

    assert!(harness.actions.events.is_empty());
    assert_eq!(harness.query_count(), 1);
    assert!(harness.controller.runtime().auto_running);
}

#[test]
fn fail_closed_policy_blocks_without_registry() {
    let mut harness = Harness::with_config(ControllerConfig {
        missing_registry_policy: MissingRegistryPolicy::FailClosed,
        ..test_config()
    });
    harness.attach_registry = false;
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);

    assert!(!harness.controller.cursor_probe().did_hit);
    assert_eq!(harness.query_count(), 0);
}

#[test]
fn custom_select_tag_moves_lmb_to_router() {
    let mut harness = Harness::with_config(ControllerConfig {
        select_tag: InputTag::Rmb,
        ..test_config()
    });
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.press(InputTag::Lmb);
    harness.release(InputTag::Lmb);
    assert_eq!(harness.actions.events.len(), 2);
    assert_eq!(harness.query_count(), 0);

    harness.press(InputTag::Rmb);
    harness.release(InputTag::Rmb);
    assert_eq!(harness.query_count(), 1);
}

#[test]
fn move_axis_follows_control_yaw() {
    let mut harness = Harness::new();
    harness.world.camera_mut().yaw_degrees = 90.0;
    harness.with_ports(|controller, ports| controller.on_move_axis(ports, 0.0, 1.0));
    assert_vec3_close(harness.world.pending_movement_input(), Vec3::new(0.0, 1.0, 0.0));

    harness.world.step(FRAME);
    harness.with_ports(|controller, ports| controller.on_move_axis(ports, 1.0, 0.0));
    assert_vec3_close(harness.world.pending_movement_input(), Vec3::new(-1.0, 0.0, 0.0));

    harness.world.step(FRAME);
    harness.registry.add_blocking(ActionClass::Movement);
    harness.with_ports(|controller, ports| controller.on_move_axis(ports, 1.0, 1.0));
    assert_eq!(harness.world.pending_movement_input(), Vec3::ZERO);
}

#[test]
fn look_applies_only_while_secondary_held() {
    let mut harness = Harness::new();
    harness.with_ports(|controller, ports| controller.on_look_axis(ports, 15.0, -5.0));
    assert_eq!(harness.world.camera().yaw_degrees, 0.0);

    harness.controller.set_secondary_held(true);
    harness.with_ports(|controller, ports| controller.on_look_axis(ports, 15.0, -5.0));
    assert_eq!(harness.world.camera().yaw_degrees, 15.0);
    assert_eq!(harness.world.camera().pitch_degrees, -50.0);
    assert!(harness.controller.runtime().right_click_held);
}

#[test]
fn jump_is_gated_and_stop_always_applies() {
    let mut harness = Harness::new();
    harness.with_ports(|controller, ports| controller.on_jump(ports));
    assert!(harness.world.is_jumping());
    harness.with_ports(|controller, ports| controller.on_stop_jumping(ports));
    assert!(!harness.world.is_jumping());

    harness.registry.add_blocking(ActionClass::Movement);
    harness.with_ports(|controller, ports| controller.on_jump(ports));
    assert!(!harness.world.is_jumping());
}

#[test]
fn zoom_scales_by_step_and_clamps() {
    let mut harness = Harness::new();
    harness.with_ports(|controller, ports| controller.on_zoom_axis(ports, 1.0));
    assert_eq!(
        harness.world.camera().arm_length,
        CAMERA_ARM_LENGTH_DEFAULT + 200.0
    );
    harness.with_ports(|controller, ports| controller.on_zoom_axis(ports, 50.0));
    assert_eq!(harness.world.camera().arm_length, CAMERA_ARM_LENGTH_MAX);
}

#[test]
fn placement_marker_follows_cursor_and_excludes_avatar() {
    let mut harness = Harness::new();
    let avatar = harness.world.avatar().expect("avatar");
    harness.point_at(Vec3::ZERO);
    assert_eq!(harness.controller.cursor_probe().hit_actor, Some(avatar));

    let decal = AssetKey::new("decal.fire_circle");
    let marker = harness.with_ports(|controller, ports| {
        controller.show_placement_marker(ports, Some(&decal))
    });
    let again = harness.with_ports(|controller, ports| controller.show_placement_marker(ports, None));
    assert_eq!(marker, again);
    assert_eq!(harness.world.marker_count(), 1);
    let shown = harness.world.marker(marker).expect("marker");
    assert_eq!(shown.class, AssetKey::new("fx.magic_circle"));
    assert_eq!(shown.decal, Some(decal));

    harness.tick();
    assert_eq!(harness.controller.cursor_probe().hit_actor, None);

    let follow_to = Vec3::new(120.0, -80.0, 0.0);
    harness.point_at(follow_to);
    assert_vec3_close(harness.world.marker(marker).expect("marker").position, follow_to);

    assert!(harness.with_ports(|controller, ports| controller.hide_placement_marker(ports)));
    assert!(!harness.with_ports(|controller, ports| controller.hide_placement_marker(ports)));
    assert_eq!(harness.world.marker_count(), 0);
    harness.point_at(Vec3::ZERO);
    assert_eq!(harness.controller.cursor_probe().hit_actor, Some(avatar));
}

#[test]
fn damage_number_anchors_at_target() {
    let mut harness = Harness::new();
    let enemy_at = Vec3::new(200.0, 50.0, 0.0);
    let enemy = harness.world.spawn("enemy", enemy_at, 40.0, enemy_caps());
    let number = DamageNumber {
        amount: 42.0,
        target: enemy,
        blocked: false,
        critical: true,
    };

    assert!(harness.with_ports(|controller, ports| controller.show_damage_number(ports, number)));
    let texts = harness.world.floating_texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].class, AssetKey::new("ui.damage_text"));
    assert_eq!(texts[0].anchor, enemy_at);
    assert!(texts[0].critical);

    assert!(harness.world.despawn(enemy));
    assert!(!harness.with_ports(|controller, ports| controller.show_damage_number(ports, number)));
    assert_eq!(harness.world.floating_texts().len(), 1);
}

#[test]
fn damage_number_requires_local_controller() {
    let mut harness = Harness::with_config(ControllerConfig {
        is_local_controller: false,
        ..test_config()
    });
    let enemy = harness
        .world
        .spawn("enemy", Vec3::new(200.0, 0.0, 0.0), 40.0, enemy_caps());
    let number = DamageNumber {
        amount: 5.0,
        target: enemy,
        blocked: true,
        critical: false,
    };
    assert!(!harness.with_ports(|controller, ports| controller.show_damage_number(ports, number)));
    assert!(harness.world.floating_texts().is_empty());
}

#[test]
fn missing_avatar_skips_movement_branch() {
    let mut harness = Harness::new();
    let avatar = harness.world.avatar().expect("avatar");
    assert!(harness.world.despawn(avatar));
    harness.point_at(Vec3::new(300.0, 0.0, 0.0));
    harness.click(0, FRAME);
    assert_eq!(harness.query_count(), 0);
    assert!(!harness.controller.runtime().auto_running);
}

/// Counts highlight toggles reaching the world.
struct CountingWorld {
    inner: SceneWorld,
    highlight_calls: usize,
}

impl ActorWorld for CountingWorld {
    fn trace_under_cursor(&self, channel: TraceChannel) -> Option<CursorHit> {
        self.inner.trace_under_cursor(channel)
    }

    fn capabilities(&self, actor: EntityId) -> Option<CapabilitySet> {
        self.inner.capabilities(actor)
    }

    fn actor_location(&self, actor: EntityId) -> Option<Vec3> {
        self.inner.actor_location(actor)
    }

    fn set_highlighted(&mut self, actor: EntityId, highlighted: bool) -> bool {
        self.highlight_calls += 1;
        self.inner.set_highlighted(actor, highlighted)
    }

    fn set_move_to_location(&mut self, actor: EntityId, destination: Vec3) -> bool {
        self.inner.set_move_to_location(actor, destination)
    }
}

impl Pawn for CountingWorld {
    fn avatar_location(&self) -> Option<Vec3> {
        self.inner.avatar_location()
    }

    fn add_movement_input(&mut self, direction: Vec3) {
        self.inner.add_movement_input(direction);
    }

    fn control_yaw_degrees(&self) -> f32 {
        self.inner.control_yaw_degrees()
    }

    fn add_yaw_input(&mut self, degrees: f32) {
        self.inner.add_yaw_input(degrees);
    }

    fn add_pitch_input(&mut self, degrees: f32) {
        self.inner.add_pitch_input(degrees);
    }

    fn jump(&mut self) {
        self.inner.jump();
    }

    fn stop_jumping(&mut self) {
        self.inner.stop_jumping();
    }

    fn adjust_camera_arm_length(&mut self, delta: f32) {
        self.inner.adjust_camera_arm_length(delta);
    }
}

impl EffectHost for CountingWorld {
    fn spawn_effect_at(&mut self, effect: &AssetKey, point: Vec3) {
        self.inner.spawn_effect_at(effect, point);
    }

    fn spawn_floating_text(&mut self, text: FloatingText) {
        self.inner.spawn_floating_text(text);
    }

    fn spawn_marker(&mut self, class: &AssetKey, decal: Option<&AssetKey>) -> MarkerId {
        self.inner.spawn_marker(class, decal)
    }

    fn move_marker(&mut self, marker: MarkerId, point: Vec3) {
        self.inner.move_marker(marker, point);
    }

    fn destroy_marker(&mut self, marker: MarkerId) -> bool {
        self.inner.destroy_marker(marker)
    }

    fn marker_exists(&self, marker: MarkerId) -> bool {
        self.inner.marker_exists(marker)
    }
}

#[test]
fn stationary_cursor_issues_no_repeat_highlight_calls() {
    let mut world = CountingWorld {
        inner: SceneWorld::default(),
        highlight_calls: 0,
    };
    world.inner.spawn_avatar(Vec3::ZERO, 30.0);
    let enemy_at = Vec3::new(200.0, 0.0, 0.0);
    world.inner.spawn("enemy", enemy_at, 40.0, enemy_caps());
    world.inner.point_cursor_at(enemy_at);
    let navigation = GridNavigation::open(4, 4, Vec3::ZERO, 100.0).expect("grid");
    let registry = TagRegistry::default();
    let mut controller = InputIntentController::new(test_config()).expect("controller");

    let mut ports = IntentPorts {
        world: &mut world,
        navigation: &navigation,
        capabilities: Some(&registry),
        actions: None,
    };
    controller.tick(&mut ports, FRAME);
    for _ in 0..10 {
        controller.tick(&mut ports, FRAME);
    }
    drop(ports);

    assert_eq!(world.highlight_calls, 1);
}
