//! Configuration loading and discovery for `lottigen.toml`
//!
//! Walks up from the working directory to find the project config; a
//! missing file is not an error, the defaults simply apply.

use super::schema::Config;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "lottigen.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse lottigen.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find `lottigen.toml` by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `lottigen.toml` by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut dir = Some(start.as_path());
    while let Some(d) = dir {
        let candidate = d.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

/// Load and validate a config file. Relative project paths are re-rooted
/// against the config file's directory.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&text)?;

    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Validation(problems));
    }

    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }

    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the effective config: an explicit path, a discovered
/// `lottigen.toml`, or the built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => match find_config() {
            Some(path) => load_config(&path),
            None => Ok(Config::default()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_from(nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_find_config_absent() {
        let dir = tempdir().unwrap();
        // Walking up from a tempdir may still hit a config in an ancestor,
        // so only assert when nothing was found below the tempdir itself
        if let Some(found) = find_config_from(dir.path().to_path_buf()) {
            assert!(!found.starts_with(dir.path()));
        }
    }

    #[test]
    fn test_load_config_reroots_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[project]\ninbox = \"incoming\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.project.inbox, dir.path().join("incoming"));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[playback]\nfps = 0\n").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_or_default_with_no_file() {
        let config = load_or_default(None);
        // Either a real config was discovered in an ancestor directory or
        // the defaults applied; both must be structurally valid
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not [valid toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
