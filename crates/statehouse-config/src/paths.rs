//! Config file locations
//!
//! Platform-specific user config locations come from the `dirs` crate:
//! - Linux: `~/.config/statehouse/config.toml`
//! - macOS: `~/Library/Application Support/statehouse/config.toml`
//! - Windows: `%APPDATA%\statehouse\config.toml`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "statehouse";

/// File name looked up in the current working directory and in the home directory
pub const LOCAL_CONFIG_FILE: &str = ".statehouse.toml";

/// Get the statehouse directory inside the user config directory
///
/// Unlike a cache directory this is never created on demand; a missing
/// directory simply means there is no user config.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_NAME))
}

/// Get path to the user config file
pub fn user_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get path to the config file in the current working directory
pub fn local_config_path() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(LOCAL_CONFIG_FILE))
}

/// Get path to the dotfile in the home directory
pub fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOCAL_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_path() {
        // Not every CI sandbox has a config dir
        if let Ok(path) = user_config_path() {
            assert!(path.ends_with("statehouse/config.toml"));
        }
    }

    #[test]
    fn test_local_config_path() {
        let local = local_config_path().unwrap();
        assert!(local.ends_with(LOCAL_CONFIG_FILE));
    }
}
