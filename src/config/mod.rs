// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info, warn};

pub use cosmic_grab_config::{ActionMode, GrabConfig, KEY_ESCAPE};

use crate::{backend::ModalOptions, input::Keysym, shell::grabs::CoordinatorOptions};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grab: GrabConfig,
}

impl Config {
    /// Loads the first config file found, or the defaults.
    pub fn load() -> Config {
        let xdg = xdg::BaseDirectories::new().ok();
        for path in Self::locations(xdg.as_ref()) {
            debug!("Trying config location: {}", path.display());
            if !path.exists() {
                continue;
            }

            info!("Using config at {}", path.display());
            match Self::from_path(&path) {
                Ok(config) => return config,
                Err(err) => {
                    warn!(?err, "Failed to read config, using defaults");
                    break;
                }
            }
        }

        Config::default()
    }

    fn locations(xdg: Option<&xdg::BaseDirectories>) -> Vec<PathBuf> {
        let mut locations = if let Some(base) = xdg {
            vec![
                base.get_config_file("cosmic-grab.ron"),
                base.get_config_file("cosmic-grab/config.ron"),
            ]
        } else {
            Vec::with_capacity(3)
        };
        if cfg!(debug_assertions) {
            if let Ok(mut cwd) = std::env::current_dir() {
                cwd.push("config.ron");
                locations.push(cwd);
            }
        }
        locations.push(PathBuf::from("/etc/cosmic-grab/config.ron"));
        locations.push(PathBuf::from("/etc/cosmic-grab.ron"));
        locations
    }

    pub fn from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Config, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub fn modal_options(&self) -> ModalOptions {
        ModalOptions {
            action_mode: self.grab.action_mode,
        }
    }

    pub fn cancel_keys(&self) -> Vec<Keysym> {
        self.grab.cancel_keys.iter().copied().map(Keysym).collect()
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions::from(&self.grab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_ron("()").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cancel_keys(), vec![Keysym::ESCAPE]);
        assert_eq!(config.modal_options().action_mode, ActionMode::POPUP);
    }

    #[test]
    fn grab_section_is_read() {
        let config = Config::from_ron(
            r#"(grab: (cancel_keys: [65307, 113], action_mode: "SYSTEM_MODAL"))"#,
        )
        .unwrap();
        assert_eq!(config.cancel_keys(), vec![Keysym::ESCAPE, Keysym(113)]);
        assert_eq!(config.modal_options().action_mode, ActionMode::SYSTEM_MODAL);

        let options = config.coordinator_options();
        assert_eq!(options.cancel_keys, config.cancel_keys());
        assert_eq!(options.modal, config.modal_options());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            Config::from_ron("(grab: (cancel_keys: 5))"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_path(Path::new("/nonexistent/cosmic-grab.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn system_locations_come_last() {
        let locations = Config::locations(None);
        assert_eq!(
            locations.last().map(PathBuf::as_path),
            Some(Path::new("/etc/cosmic-grab.ron"))
        );
    }
}
