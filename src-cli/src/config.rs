use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use comment_engine::EngineConfig;

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("event-comments"))
}

pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

/// Load the engine config from `path`, or from the default location when no
/// path is given. A missing file means defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                log::debug!("no config directory on this platform, using defaults");
                return Ok(EngineConfig::default());
            }
        },
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(EngineConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let config = serde_json::from_str(&content)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "max_content_chars": 20 }"#).unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.max_content_chars, 20);
        assert_eq!(config.max_display_depth, 3);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ max_content_chars: }").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }
}
