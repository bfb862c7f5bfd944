use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::mask::{BrushOptions, BRUSH_SIZE_DEFAULT};
use crate::remote::PollPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG base directory nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "retouch";
const APP_CONFIG_FILE: &str = "config.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_POLL_MAX_INTERVAL_MS: u64 = 30_000;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub brush_size: u16,
    pub poll_interval_ms: u64,
    pub poll_backoff_factor: f32,
    pub poll_max_interval_ms: u64,
    pub poll_max_attempts: Option<u32>,
    pub poll_max_duration_secs: Option<u64>,
    pub session_dir: Option<PathBuf>,
    pub desktop_notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brush_size: BRUSH_SIZE_DEFAULT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_backoff_factor: 1.0,
            poll_max_interval_ms: DEFAULT_POLL_MAX_INTERVAL_MS,
            poll_max_attempts: None,
            poll_max_duration_secs: None,
            session_dir: None,
            desktop_notifications: true,
        }
    }
}

impl AppConfig {
    pub fn brush(&self) -> BrushOptions {
        BrushOptions::new(self.brush_size)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            backoff_factor: self.poll_backoff_factor.max(1.0),
            max_interval: Duration::from_millis(self.poll_max_interval_ms),
            max_attempts: self.poll_max_attempts.filter(|max| *max > 0),
            max_duration: self.poll_max_duration_secs.map(Duration::from_secs),
        }
    }

    /// Configured session directory, else the XDG data directory.
    pub fn resolved_session_dir(&self) -> Result<PathBuf, ConfigPathError> {
        if let Some(dir) = self.session_dir.as_ref() {
            return Ok(dir.clone());
        }
        let (xdg_data_home, home) = data_env_dirs();
        default_session_dir(xdg_data_home.as_deref(), home.as_deref())
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn data_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_config_home, home, ".config")?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn default_session_dir(
    xdg_data_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_data_home, home, ".local/share")?;
    path.push(APP_DIR);
    Ok(path)
}

fn xdg_root(
    xdg_dir: Option<&Path>,
    home: Option<&Path>,
    home_fallback: &str,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_dir.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(home_fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "retouch",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/retouch/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("retouch", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/retouch/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("retouch", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn session_dir_falls_back_to_local_share() {
        let path = default_session_dir(Some(Path::new("")), Some(Path::new("/tmp/home")))
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/home/.local/share/retouch"));
    }

    #[test]
    fn explicit_session_dir_wins() {
        let config = AppConfig {
            session_dir: Some(PathBuf::from("/srv/sessions")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolved_session_dir().unwrap(),
            PathBuf::from("/srv/sessions")
        );
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config_with(Some(dir.path()), None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn partial_config_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("retouch");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.json"),
            r#"{ "brush_size": 12, "poll_max_attempts": 60 }"#,
        )
        .unwrap();

        let config = load_app_config_with(Some(dir.path()), None);
        assert_eq!(config.brush().size(), 12);
        assert_eq!(config.poll_policy().max_attempts, Some(60));
        assert_eq!(config.poll_policy().interval, Duration::from_secs(5));
        assert!(config.desktop_notifications);
    }

    #[test]
    fn unparsable_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("retouch");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.json"), "{ brush_size: ").unwrap();

        assert_eq!(load_app_config_with(Some(dir.path()), None), AppConfig::default());
    }
}
