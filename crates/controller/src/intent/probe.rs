use engine::{ActorWorld, EntityId, TraceChannel, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorProbeResult {
    pub did_hit: bool,
    pub impact_point: Vec3,
    pub normal: Vec3,
    pub hit_actor: Option<EntityId>,
}

impl CursorProbeResult {
    pub const MISS: CursorProbeResult = CursorProbeResult {
        did_hit: false,
        impact_point: Vec3::ZERO,
        normal: Vec3::ZERO,
        hit_actor: None,
    };
}

/// Traces from the cursor into the world. With `exclude_avatars` the trace
/// passes through avatars so a placement marker can land behind them.
pub(crate) fn probe<W: ActorWorld + ?Sized>(world: &W, exclude_avatars: bool) -> CursorProbeResult {
    let channel = if exclude_avatars {
        TraceChannel::ExcludeAvatars
    } else {
        TraceChannel::Visibility
    };
    match world.trace_under_cursor(channel) {
        Some(hit) => CursorProbeResult {
            did_hit: true,
            impact_point: hit.impact_point,
            normal: hit.normal,
            hit_actor: hit.actor,
        },
        None => CursorProbeResult::MISS,
    }
}
