use std::process::ExitCode;

use controller::intent::DamageNumber;
use controller::{InputIntentController, IntentPorts};
use engine::{EntityId, InputTag, Pawn, INPUT_TAG_COUNT};
use tracing::{debug, info};

use super::bootstrap::AppWiring;
use super::demo::{DemoSession, ScriptedInput};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) session_seconds: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            session_seconds: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SessionReport {
    pub(crate) ticks: u64,
    pub(crate) scripted_inputs: usize,
    pub(crate) locked_target: Option<EntityId>,
    pub(crate) auto_running: bool,
    pub(crate) effects_spawned: usize,
    pub(crate) damage_numbers: usize,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut controller,
        mut session,
    } = app;

    controller.subscribe_target_changed(|target| info!(actor = ?target, "target_changed"));
    let report = run_session(&config, &mut controller, &mut session);

    let avatar = session.world.avatar_location();
    info!(
        ticks = report.ticks,
        scripted_inputs = report.scripted_inputs,
        locked_target = ?report.locked_target,
        auto_running = report.auto_running,
        avatar_x = avatar.map(|point| point.x),
        avatar_y = avatar.map(|point| point.y),
        effects = report.effects_spawned,
        damage_numbers = report.damage_numbers,
        abilities_pressed = session.actions.pressed,
        abilities_released = session.actions.released,
        abilities_held = session.actions.held,
        camera_arm_length = session.world.camera().arm_length,
        "session_complete"
    );
    ExitCode::SUCCESS
}

// Frame order: controller tick, scripted input events, world step.
pub(crate) fn run_session(
    config: &LoopConfig,
    controller: &mut InputIntentController,
    session: &mut DemoSession,
) -> SessionReport {
    let target_tps = config.target_tps.max(1);
    let fixed_dt_seconds = 1.0 / target_tps as f32;
    let total_ticks = (config.session_seconds.max(0.0) * target_tps as f32).round() as u64;

    let mut held = [false; INPUT_TAG_COUNT];
    let mut next_step = 0;
    let mut frame_inputs = Vec::new();
    let mut effects_spawned = 0;
    let mut damage_numbers = 0;

    for tick in 0..total_ticks {
        let now = tick as f32 * fixed_dt_seconds;
        frame_inputs.clear();
        while let Some(step) = session
            .script
            .get(next_step)
            .filter(|step| step.at_seconds <= now + fixed_dt_seconds * 0.5)
        {
            frame_inputs.push(step.input);
            next_step += 1;
        }

        for input in &frame_inputs {
            if let ScriptedInput::Aim(target) = input {
                session.cursor = Some(*target);
            }
        }
        session.refresh_cursor();

        let DemoSession {
            world,
            navigation,
            registry,
            actions,
            enemy,
            ..
        } = &mut *session;
        let mut ports = IntentPorts {
            world: &mut *world,
            navigation: &*navigation,
            capabilities: Some(&*registry),
            actions: Some(actions),
        };

        controller.tick(&mut ports, fixed_dt_seconds);

        let mut pressed_this_frame = [false; INPUT_TAG_COUNT];
        for input in frame_inputs.iter().copied() {
            debug!(tick, input = ?input, "scripted_input");
            match input {
                ScriptedInput::Aim(_) => {}
                ScriptedInput::Press(tag) => {
                    held[tag.index()] = true;
                    pressed_this_frame[tag.index()] = true;
                    controller.on_input_pressed(&mut ports, tag);
                }
                ScriptedInput::Release(tag) => {
                    held[tag.index()] = false;
                    controller.on_input_released(&mut ports, tag);
                }
                ScriptedInput::ShowPlacementMarker => {
                    controller.show_placement_marker(&mut ports, None);
                }
                ScriptedInput::HidePlacementMarker => {
                    controller.hide_placement_marker(&mut ports);
                }
                ScriptedInput::Zoom(axis) => controller.on_zoom_axis(&mut ports, axis),
                ScriptedInput::DamageEnemy(amount) => {
                    let number = DamageNumber {
                        amount,
                        target: *enemy,
                        blocked: false,
                        critical: false,
                    };
                    controller.show_damage_number(&mut ports, number);
                }
            }
        }

        for tag in InputTag::ALL {
            if held[tag.index()] && !pressed_this_frame[tag.index()] {
                controller.on_input_held(&mut ports, tag, fixed_dt_seconds);
            }
        }

        world.step(fixed_dt_seconds);
        effects_spawned += world.drain_spawned_effects().len();
        damage_numbers += world.drain_floating_texts().len();
    }

    SessionReport {
        ticks: total_ticks,
        scripted_inputs: next_step,
        locked_target: controller.locked_target(),
        auto_running: controller.runtime().auto_running,
        effects_spawned,
        damage_numbers,
    }
}
