use crate::paths::{home_config_path, local_config_path, user_config_path};
use std::path::PathBuf;

/// Load config file content from the first location that has one
///
/// Searches in order:
/// 1. `.statehouse.toml` in the current working directory
/// 2. `statehouse/config.toml` in the user config directory
/// 3. `.statehouse.toml` in the home directory
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    candidate_paths()
        .into_iter()
        .find_map(|path| match std::fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("Loaded config from {}", path.display());
                Some(content)
            }
            Err(_) => None,
        })
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Ok(local) = local_config_path() {
        paths.push(local);
    }
    if let Ok(user) = user_config_path() {
        paths.push(user);
    }
    if let Some(home) = home_config_path() {
        paths.push(home);
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config_is_searched_first() {
        let paths = candidate_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with(crate::paths::LOCAL_CONFIG_FILE));
    }
}
