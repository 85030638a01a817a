use engine::{
    ActionEngine, Capability, CapabilitySet, EntityId, GridNavigation, InputTag, NavigationError,
    SceneWorld, TagRegistry, Vec3,
};
use tracing::info;

const GRID_CELL_SIZE: f32 = 100.0;
const GRID_ROWS: [&str; 16] = [
    "................",
    "................",
    "................",
    "................",
    "................",
    "..........#.....",
    "..........#.....",
    "..........#.....",
    "..........#.....",
    "..........#.....",
    "................",
    "................",
    "................",
    "................",
    "................",
    "................",
];
const AVATAR_PICK_RADIUS: f32 = 30.0;
const ACTOR_PICK_RADIUS: f32 = 45.0;

/// Where the scripted cursor rests. Actor targets are re-resolved every frame
/// so the cursor stays on them while the camera follows the avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CursorTarget {
    Ground(Vec3),
    Enemy,
    Follower,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ScriptedInput {
    Aim(CursorTarget),
    Press(InputTag),
    Release(InputTag),
    ShowPlacementMarker,
    HidePlacementMarker,
    Zoom(f32),
    DamageEnemy(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScriptStep {
    pub(crate) at_seconds: f32,
    pub(crate) input: ScriptedInput,
}

#[derive(Debug, Default)]
pub(crate) struct LoggingActionEngine {
    pub(crate) pressed: u32,
    pub(crate) released: u32,
    pub(crate) held: u32,
}

impl ActionEngine for LoggingActionEngine {
    fn on_input_pressed(&mut self, tag: InputTag) {
        self.pressed += 1;
        info!(tag = tag.as_token(), "ability_pressed");
    }

    fn on_input_released(&mut self, tag: InputTag) {
        self.released += 1;
        info!(tag = tag.as_token(), "ability_released");
    }

    fn on_input_held(&mut self, _tag: InputTag) {
        self.held += 1;
    }
}

pub(crate) struct DemoSession {
    pub(crate) world: SceneWorld,
    pub(crate) navigation: GridNavigation,
    pub(crate) registry: TagRegistry,
    pub(crate) actions: LoggingActionEngine,
    pub(crate) enemy: EntityId,
    pub(crate) follower: EntityId,
    pub(crate) script: Vec<ScriptStep>,
    pub(crate) cursor: Option<CursorTarget>,
}

impl DemoSession {
    pub(crate) fn build() -> Result<Self, NavigationError> {
        let mut world = SceneWorld::default();
        world.spawn_avatar(Vec3::ZERO, AVATAR_PICK_RADIUS);
        let enemy = world.spawn(
            "training_dummy",
            Vec3::new(400.0, 200.0, 0.0),
            ACTOR_PICK_RADIUS,
            CapabilitySet::of(&[Capability::Highlightable, Capability::Actionable]),
        );
        let follower = world.spawn(
            "follower",
            Vec3::new(-300.0, 100.0, 0.0),
            ACTOR_PICK_RADIUS,
            CapabilitySet::of(&[Capability::Highlightable, Capability::SettableDestination]),
        );

        let navigation = build_navigation()?;
        info!(
            width = navigation.width(),
            height = navigation.height(),
            "demo_world_ready"
        );

        Ok(Self {
            world,
            navigation,
            registry: TagRegistry::default(),
            actions: LoggingActionEngine::default(),
            enemy,
            follower,
            script: demo_script(),
            cursor: None,
        })
    }

    pub(crate) fn refresh_cursor(&mut self) {
        let point = match self.cursor {
            Some(CursorTarget::Ground(point)) => Some(point),
            Some(CursorTarget::Enemy) => self.world.entity(self.enemy).map(|e| e.position),
            Some(CursorTarget::Follower) => self.world.entity(self.follower).map(|e| e.position),
            None => None,
        };
        match point {
            Some(point) => self.world.point_cursor_at(point),
            None => self.world.set_cursor_px(None),
        }
    }
}

fn grid_origin() -> Vec3 {
    let half_extent = GRID_ROWS.len() as f32 * GRID_CELL_SIZE * 0.5;
    Vec3::new(-half_extent, -half_extent, 0.0)
}

fn build_navigation() -> Result<GridNavigation, NavigationError> {
    GridNavigation::from_rows(&GRID_ROWS, grid_origin(), GRID_CELL_SIZE)
}

fn demo_script() -> Vec<ScriptStep> {
    use ScriptedInput::*;

    let step = |at_seconds: f32, input: ScriptedInput| ScriptStep { at_seconds, input };
    vec![
        step(0.0, Aim(CursorTarget::Ground(Vec3::new(300.0, -200.0, 0.0)))),
        step(0.1, Press(InputTag::Lmb)),
        step(0.3, Release(InputTag::Lmb)),
        step(2.0, Aim(CursorTarget::Enemy)),
        step(2.1, Press(InputTag::Lmb)),
        step(2.2, Release(InputTag::Lmb)),
        step(2.4, Press(InputTag::Lmb)),
        step(3.4, Release(InputTag::Lmb)),
        step(3.5, DamageEnemy(37.0)),
        step(3.6, ShowPlacementMarker),
        step(3.7, Aim(CursorTarget::Ground(Vec3::new(100.0, 300.0, 0.0)))),
        step(4.2, HidePlacementMarker),
        step(4.4, Aim(CursorTarget::Follower)),
        step(4.6, Press(InputTag::Lmb)),
        step(4.7, Release(InputTag::Lmb)),
        step(5.0, Press(InputTag::Key1)),
        step(5.2, Release(InputTag::Key1)),
        step(5.5, Zoom(-1.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_grid_is_valid_and_walls_block_the_straight_line() {
        let navigation = build_navigation().expect("demo grid");
        assert!(!navigation.is_walkable_at(Vec3::new(250.0, 0.0, 0.0)));
        assert!(navigation.is_walkable_at(Vec3::new(300.0, -200.0, 0.0)));
    }

    #[test]
    fn script_is_sorted_by_time() {
        let script = demo_script();
        assert!(script
            .windows(2)
            .all(|pair| pair[0].at_seconds <= pair[1].at_seconds));
    }
}
