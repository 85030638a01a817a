use engine::{closest_point_on_segment, NavigationService, Vec3};
use tracing::debug;

/// Waypoints of the last successful path query. Replaced wholesale, never
/// edited in place. Empty means "no path".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathCache {
    waypoints: Vec<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PathProjection {
    pub(crate) location: Vec3,
    pub(crate) direction: Vec3,
}

impl PathCache {
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    pub(crate) fn replace(&mut self, waypoints: Vec<Vec3>) {
        self.waypoints = waypoints;
    }

    pub(crate) fn project(&self, point: Vec3) -> Option<PathProjection> {
        match self.waypoints.as_slice() {
            [] => None,
            [only] => Some(PathProjection {
                location: *only,
                direction: (*only - point).safe_normal(),
            }),
            waypoints => {
                let mut best: Option<(f32, PathProjection)> = None;
                for segment in waypoints.windows(2) {
                    let location = closest_point_on_segment(point, segment[0], segment[1]);
                    let distance_sq = (location - point).length_squared();
                    // Ties go to the later segment so a joint steers onward.
                    if best.is_some_and(|(best_sq, _)| distance_sq > best_sq) {
                        continue;
                    }
                    best = Some((
                        distance_sq,
                        PathProjection {
                            location,
                            direction: (segment[1] - segment[0]).safe_normal(),
                        },
                    ));
                }
                best.map(|(_, projection)| projection)
            }
        }
    }
}

pub(crate) fn plan_path<N: NavigationService + ?Sized>(
    navigation: &N,
    from: Vec3,
    to: Vec3,
) -> Option<Vec<Vec3>> {
    match navigation.find_path(from, to) {
        Some(waypoints) if !waypoints.is_empty() => Some(waypoints),
        _ => {
            debug!(
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                "path_query_failed"
            );
            None
        }
    }
}
