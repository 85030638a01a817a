use std::path::PathBuf;

use controller::config::{ConfigError, ControllerConfig};
use controller::InputIntentController;
use engine::{AssetKey, NavigationError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo::DemoSession;
use super::loop_runner::LoopConfig;

const CONFIG_PATH_ENV_VAR: &str = "INTENT_CONFIG_PATH";

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("demo navigation grid is invalid: {0}")]
    Navigation(#[from] NavigationError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) controller: InputIntentController,
    pub(crate) session: DemoSession,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Input Intent Session ===");

    let controller_config = match config_path_from_env() {
        Some(path) => {
            info!(path = %path.display(), "controller_config_loading");
            ControllerConfig::load_from_path(&path)?
        }
        None => demo_controller_config(),
    };
    let controller = InputIntentController::new(controller_config)?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        controller,
        session: DemoSession::build()?,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn demo_controller_config() -> ControllerConfig {
    ControllerConfig {
        click_effect: Some(AssetKey::new("fx.cursor_click")),
        damage_text_class: Some(AssetKey::new("ui.damage_text")),
        placement_marker_class: Some(AssetKey::new("fx.magic_circle")),
        ..ControllerConfig::default()
    }
}
