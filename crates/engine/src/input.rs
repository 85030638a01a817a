use serde::{Deserialize, Serialize};

/// Input tag bound to an ability slot. One tag is designated as the
/// controller's select tag; the rest route straight to the action engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTag {
    Lmb,
    Rmb,
    Key1,
    Key2,
    Key3,
    Key4,
    Passive1,
    Passive2,
}

pub const INPUT_TAG_COUNT: usize = 8;

impl InputTag {
    pub const ALL: [InputTag; INPUT_TAG_COUNT] = [
        InputTag::Lmb,
        InputTag::Rmb,
        InputTag::Key1,
        InputTag::Key2,
        InputTag::Key3,
        InputTag::Key4,
        InputTag::Passive1,
        InputTag::Passive2,
    ];

    pub const fn index(self) -> usize {
        match self {
            InputTag::Lmb => 0,
            InputTag::Rmb => 1,
            InputTag::Key1 => 2,
            InputTag::Key2 => 3,
            InputTag::Key3 => 4,
            InputTag::Key4 => 5,
            InputTag::Passive1 => 6,
            InputTag::Passive2 => 7,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            InputTag::Lmb => "input.lmb",
            InputTag::Rmb => "input.rmb",
            InputTag::Key1 => "input.1",
            InputTag::Key2 => "input.2",
            InputTag::Key3 => "input.3",
            InputTag::Key4 => "input.4",
            InputTag::Passive1 => "input.passive.1",
            InputTag::Passive2 => "input.passive.2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceChannel {
    Visibility,
    ExcludeAvatars,
}
