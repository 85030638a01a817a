use engine::{AssetKey, EffectHost, EntityId, MarkerId, Vec3};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageNumber {
    pub amount: f32,
    pub target: EntityId,
    pub blocked: bool,
    pub critical: bool,
}

#[derive(Debug, Default)]
pub(crate) struct PlacementMarkerSlot {
    marker: Option<MarkerId>,
}

impl PlacementMarkerSlot {
    pub(crate) fn is_active<E: EffectHost + ?Sized>(&self, effects: &E) -> bool {
        self.marker.is_some_and(|marker| effects.marker_exists(marker))
    }

    pub(crate) fn show<E: EffectHost + ?Sized>(
        &mut self,
        effects: &mut E,
        class: &AssetKey,
        decal: Option<&AssetKey>,
        at: Vec3,
    ) -> MarkerId {
        if let Some(marker) = self.marker.filter(|marker| effects.marker_exists(*marker)) {
            return marker;
        }
        let marker = effects.spawn_marker(class, decal);
        effects.move_marker(marker, at);
        debug!(marker = marker.0, class = %class, "placement_marker_shown");
        self.marker = Some(marker);
        marker
    }

    pub(crate) fn hide<E: EffectHost + ?Sized>(&mut self, effects: &mut E) -> bool {
        let Some(marker) = self.marker.take() else {
            return false;
        };
        let destroyed = effects.destroy_marker(marker);
        if destroyed {
            debug!(marker = marker.0, "placement_marker_hidden");
        }
        destroyed
    }

    pub(crate) fn follow<E: EffectHost + ?Sized>(&mut self, effects: &mut E, point: Vec3) {
        match self.marker {
            Some(marker) if effects.marker_exists(marker) => effects.move_marker(marker, point),
            Some(_) => self.marker = None,
            None => {}
        }
    }
}
