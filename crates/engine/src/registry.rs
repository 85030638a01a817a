use std::collections::BTreeMap;

use tracing::debug;

use crate::{ActionClass, CapabilityRegistry};

/// Reference-counted blocking tags. Several effects may apply the same tag;
/// it stays active until every one of them has removed it.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    counts: BTreeMap<ActionClass, u32>,
}

impl TagRegistry {
    pub fn add_blocking(&mut self, class: ActionClass) {
        let count = self.counts.entry(class).or_insert(0);
        *count = count.saturating_add(1);
        debug!(tag = class.as_token(), count = *count, "blocking_tag_added");
    }

    /// Returns `false` when the tag was not applied.
    pub fn remove_blocking(&mut self, class: ActionClass) -> bool {
        let Some(count) = self.counts.get_mut(&class) else {
            return false;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(&class);
        }
        debug!(tag = class.as_token(), count = remaining, "blocking_tag_removed");
        true
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn active_tags(&self) -> impl Iterator<Item = ActionClass> + '_ {
        self.counts.keys().copied()
    }
}

impl CapabilityRegistry for TagRegistry {
    fn has_blocking_tag(&self, class: ActionClass) -> bool {
        self.counts.contains_key(&class)
    }
}
