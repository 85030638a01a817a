use engine::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverHandle(u64);

type TargetCallback = Box<dyn FnMut(Option<EntityId>)>;

/// Ordered target-changed subscribers, invoked synchronously in registration
/// order.
#[derive(Default)]
pub(crate) struct TargetObservers {
    next_handle: u64,
    entries: Vec<(ObserverHandle, TargetCallback)>,
}

impl TargetObservers {
    pub(crate) fn subscribe(&mut self, callback: TargetCallback) -> ObserverHandle {
        let handle = ObserverHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.entries.push((handle, callback));
        handle
    }

    pub(crate) fn unsubscribe(&mut self, handle: ObserverHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != handle);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, target: Option<EntityId>) {
        for (_, callback) in &mut self.entries {
            callback(target);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for TargetObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetObservers")
            .field("subscribers", &self.entries.len())
            .finish()
    }
}
