//! Options file discovery, creation, and loading.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::ConfigureParams;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Custom configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

const DEFAULT_CONFIG: &str = r#"# locatr tracking options
#
# Changes are picked up automatically and take effect the next time
# tracking is started.

distance_filter_meters = 0        # Minimum movement between fixes (0 = no filtering)
requested_accuracy_distance = 10  # Desired accuracy in meters (0 = navigation grade)
interval_ms = 5000                # Update interval in milliseconds
aggressive_interval_ms = 2000     # Interval while actively moving, in milliseconds
activity_label = "Other"          # AutomotiveNavigation, OtherNavigation, Fitness, Other
debug = false                     # Verbose logging and a notification per fix
use_activity_detection = false    # Activity-recognition hint for the source
"#;

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of the options file: `<custom dir>/locatr.toml` or
/// `$XDG_CONFIG_HOME/locatr/locatr.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(dir) = get_custom_config_dir() {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load the options file, creating it with defaults first if it does not exist.
pub fn load() -> Result<ConfigureParams> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path)
}

/// Load the options file at `path` without creating anything.
pub fn load_from_path(path: &Path) -> Result<ConfigureParams> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", private_path(path)))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", private_path(path)))
}

/// Write the commented default options file to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory {}", private_path(parent))
        })?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write default config {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));
    Ok(())
}
