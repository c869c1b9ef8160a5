pub mod devices;
pub mod logs;
pub mod run;

use std::path::Path;

use anyhow::Context;
use joyservo_core::JoyservoConfig;

/// Load the config from `path`, `./joyservo.toml`, or built-in defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<JoyservoConfig> {
    JoyservoConfig::load_or_default(path).context("Failed to load configuration")
}
