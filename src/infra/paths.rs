// src/infra/paths.rs — Config path resolution
//
// TAILSCORE_HOME overrides everything. Otherwise the platform config
// directory is used (XDG_CONFIG_HOME/tailscore on Linux).

use directories::ProjectDirs;
use std::path::PathBuf;

/// Returns the TAILSCORE_HOME override, if set.
fn tailscore_home() -> Option<PathBuf> {
    std::env::var_os("TAILSCORE_HOME").map(PathBuf::from)
}

/// Configuration directory, or `None` when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = tailscore_home() {
        return Some(home);
    }
    ProjectDirs::from("", "", "tailscore").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Main config file path
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_toml() {
        if let Some(path) = config_file_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
