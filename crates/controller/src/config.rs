use std::fs;
use std::path::{Path, PathBuf};

use engine::{AssetKey, InputTag};
use serde::Deserialize;
use thiserror::Error;

use crate::intent::MissingRegistryPolicy;

pub const DEFAULT_HOLD_THRESHOLD_SECONDS: f32 = 0.5;
pub const DEFAULT_AUTO_RUN_ACCEPTANCE_RADIUS: f32 = 50.0;
pub const DEFAULT_CAMERA_ZOOM_STEP: f32 = 200.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read controller config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid controller config at `{path}`: {message}")]
    Parse { path: String, message: String },
    #[error("controller config is missing required reference `{field}`")]
    MissingReference { field: &'static str },
    #[error("controller config field `{field}` must be finite and non-negative, got {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub hold_threshold_seconds: f32,
    pub auto_run_acceptance_radius: f32,
    pub select_tag: InputTag,
    pub camera_zoom_step: f32,
    pub is_local_controller: bool,
    pub missing_registry_policy: MissingRegistryPolicy,
    pub click_effect: Option<AssetKey>,
    pub damage_text_class: Option<AssetKey>,
    pub placement_marker_class: Option<AssetKey>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            hold_threshold_seconds: DEFAULT_HOLD_THRESHOLD_SECONDS,
            auto_run_acceptance_radius: DEFAULT_AUTO_RUN_ACCEPTANCE_RADIUS,
            select_tag: InputTag::Lmb,
            camera_zoom_step: DEFAULT_CAMERA_ZOOM_STEP,
            is_local_controller: true,
            missing_registry_policy: MissingRegistryPolicy::FailOpen,
            click_effect: None,
            damage_text_class: None,
            placement_marker_class: None,
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| ConfigError::Parse {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<ControllerAssets, ConfigError> {
        for (field, value) in [
            ("hold_threshold_seconds", self.hold_threshold_seconds),
            ("auto_run_acceptance_radius", self.auto_run_acceptance_radius),
            ("camera_zoom_step", self.camera_zoom_step),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        Ok(ControllerAssets {
            click_effect: required(&self.click_effect, "click_effect")?,
            damage_text_class: required(&self.damage_text_class, "damage_text_class")?,
            placement_marker_class: required(
                &self.placement_marker_class,
                "placement_marker_class",
            )?,
        })
    }
}

fn required(value: &Option<AssetKey>, field: &'static str) -> Result<AssetKey, ConfigError> {
    value
        .clone()
        .filter(|key| !key.as_str().trim().is_empty())
        .ok_or(ConfigError::MissingReference { field })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerAssets {
    pub click_effect: AssetKey,
    pub damage_text_class: AssetKey,
    pub placement_marker_class: AssetKey,
}
