//! Locating and loading the engine configuration.

use std::path::PathBuf;

use mirtarget_engine::{resolve_browser_path, EngineConfig, EngineResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MIRTL_CONFIG";

/// Resolve the config file: explicit path, `MIRTL_CONFIG`, then `~/.mirtargetlink/config.json` if present.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.trim().is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    let default = PathBuf::from(home).join(".mirtargetlink").join("config.json");
    default.exists().then_some(default)
}

/// Build the effective config: file (or defaults), then env overrides, then the `--chrome` flag.
pub fn load_config(explicit: Option<&str>, chrome: Option<&str>) -> EngineResult<EngineConfig> {
    let config = match resolve_config_path(explicit) {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            EngineConfig::from_file(&path)?
        }
        None => EngineConfig::default(),
    };

    let mut config = config.apply_env();
    if let Some(path) = chrome.and_then(|c| resolve_browser_path(Some(c))) {
        config.browser.executable = Some(path);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some("/tmp/mirtl.json")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/mirtl.json"));
    }

    #[test]
    fn test_load_explicit_file_and_chrome_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "row_limit": 5, "reload": { "settle_delay_ms": 0 } }"#).unwrap();

        let config = load_config(path.to_str(), Some("/opt/chromium/chrome")).unwrap();
        assert_eq!(config.row_limit, 5);
        assert_eq!(config.reload.settle_delay_ms, 0);
        assert_eq!(
            config.browser.executable,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let err = load_config(Some("/nonexistent/mirtl/config.json"), None).unwrap_err();
        assert_eq!(err.kind().as_str(), "validation_error");
    }
}
