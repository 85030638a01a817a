//! Input-intent resolution for a click-to-move, cursor-targeted avatar.

pub mod config;
pub mod intent;

pub use config::{ConfigError, ControllerConfig};
pub use intent::{InputIntentController, IntentPorts};
