use engine::{ActionClass, CapabilityRegistry};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRegistryPolicy {
    #[default]
    FailOpen,
    FailClosed,
}

#[derive(Debug, Default)]
pub(crate) struct CapabilityGate {
    policy: MissingRegistryPolicy,
    warned_missing_registry: bool,
}

impl CapabilityGate {
    pub(crate) fn new(policy: MissingRegistryPolicy) -> Self {
        Self {
            policy,
            warned_missing_registry: false,
        }
    }

    pub(crate) fn is_blocked<R: CapabilityRegistry + ?Sized>(
        &mut self,
        registry: Option<&R>,
        class: ActionClass,
    ) -> bool {
        if let Some(registry) = registry {
            return registry.has_blocking_tag(class);
        }
        if !self.warned_missing_registry {
            self.warned_missing_registry = true;
            warn!(
                tag = class.as_token(),
                policy = ?self.policy,
                "capability_registry_missing"
            );
        }
        self.policy == MissingRegistryPolicy::FailClosed
    }
}
