use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Capability {
    Highlightable = 0,
    Actionable = 1,
    SettableDestination = 2,
    /// A player avatar; skipped by the cursor trace while a placement marker
    /// is shown.
    Avatar = 3,
}

impl Capability {
    const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
    bits: u8,
}

impl CapabilitySet {
    pub const EMPTY: CapabilitySet = CapabilitySet { bits: 0 };

    pub fn of(capabilities: &[Capability]) -> Self {
        let mut set = Self::EMPTY;
        for capability in capabilities {
            set.insert(*capability);
        }
        set
    }

    pub fn insert(&mut self, capability: Capability) {
        self.bits |= capability.mask();
    }

    pub fn remove(&mut self, capability: Capability) {
        self.bits &= !capability.mask();
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.bits & capability.mask() != 0
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Movement,
    CursorTrace,
    InputPressed,
    InputReleased,
    InputHeld,
}

impl ActionClass {
    pub const ALL: [ActionClass; 5] = [
        ActionClass::Movement,
        ActionClass::CursorTrace,
        ActionClass::InputPressed,
        ActionClass::InputReleased,
        ActionClass::InputHeld,
    ];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Movement => "player.block.movement",
            Self::CursorTrace => "player.block.cursor_trace",
            Self::InputPressed => "player.block.input_pressed",
            Self::InputReleased => "player.block.input_released",
            Self::InputHeld => "player.block.input_held",
        }
    }
}
