use engine::{ActorWorld, Capability, EntityId};
use tracing::trace;

/// Actors the controller keeps track of between ticks. `previous` is the
/// prior tick's `current`; `locked` only changes through ability targeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorPointerTriple {
    pub current: Option<EntityId>,
    pub previous: Option<EntityId>,
    pub locked: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetingState {
    TargetingEnemy,
    TargetingNonEnemy,
    #[default]
    NotTargeting,
}

pub(crate) fn is_live<W: ActorWorld + ?Sized>(world: &W, actor: Option<EntityId>) -> Option<EntityId> {
    actor.filter(|id| world.capabilities(*id).is_some())
}

pub(crate) fn supports<W: ActorWorld + ?Sized>(
    world: &W,
    actor: Option<EntityId>,
    capability: Capability,
) -> bool {
    actor
        .and_then(|id| world.capabilities(id))
        .is_some_and(|set| set.supports(capability))
}

pub(crate) fn classify<W: ActorWorld + ?Sized>(world: &W, actor: Option<EntityId>) -> TargetingState {
    match is_live(world, actor) {
        Some(_) if supports(world, actor, Capability::Actionable) => TargetingState::TargetingEnemy,
        Some(_) => TargetingState::TargetingNonEnemy,
        None => TargetingState::NotTargeting,
    }
}

/// Highlight calls fire only on change. Returns the number of toggles issued.
pub(crate) fn apply_hit<W: ActorWorld + ?Sized>(
    pointers: &mut ActorPointerTriple,
    world: &mut W,
    hit_actor: Option<EntityId>,
) -> usize {
    let hovered = hit_actor.filter(|_| supports(&*world, hit_actor, Capability::Highlightable));

    pointers.previous = is_live(&*world, pointers.current);
    pointers.current = hovered;
    if pointers.previous == pointers.current {
        return 0;
    }

    trace!(
        previous = ?pointers.previous,
        current = ?pointers.current,
        "hover_changed"
    );
    let mut toggles = 0;
    if set_highlight(world, pointers.previous, false) {
        toggles += 1;
    }
    if set_highlight(world, pointers.current, true) {
        toggles += 1;
    }
    toggles
}

pub(crate) fn clear_hover<W: ActorWorld + ?Sized>(pointers: &mut ActorPointerTriple, world: &mut W) {
    set_highlight(world, pointers.previous, false);
    set_highlight(world, pointers.current, false);
    pointers.previous = None;
    pointers.current = None;
}

fn set_highlight<W: ActorWorld + ?Sized>(world: &mut W, actor: Option<EntityId>, highlighted: bool) -> bool {
    let Some(id) = actor else {
        return false;
    };
    if !supports(&*world, actor, Capability::Highlightable) {
        return false;
    }
    world.set_highlighted(id, highlighted)
}
